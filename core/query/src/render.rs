use kg_loader_schemas::FactResult;

use crate::flow::QueryOutcome;

/// One block per fact: id, text, validity bounds when known, separator.
pub fn render_facts(facts: &[FactResult]) -> String {
    let mut out = String::new();
    for fact in facts {
        out.push_str(&format!("UUID: {}\n", fact.uuid));
        out.push_str(&format!("Fact: {}\n", fact.fact));
        if let Some(valid_at) = fact.valid_at {
            out.push_str(&format!("Valid from: {}\n", valid_at.to_rfc3339()));
        }
        if let Some(invalid_at) = fact.invalid_at {
            out.push_str(&format!("Valid until: {}\n", invalid_at.to_rfc3339()));
        }
        out.push_str("---\n");
    }
    out
}

/// Facts as a `- ` bullet list, e.g. for pasting into a prompt.
pub fn facts_to_bullets(facts: &[FactResult]) -> String {
    facts
        .iter()
        .map(|f| format!("- {}", f.fact))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::NoResults => "No results.\n".to_string(),
        QueryOutcome::Found {
            facts,
            center,
            reranked,
        } => {
            let mut out = format!("Search Results:\n{}", render_facts(facts));
            if let Some(reranked) = reranked {
                out.push_str("\nReranking search results based on graph distance:\n");
                out.push_str(&format!("Using center node UUID: {}\n", center));
                out.push_str(&format!(
                    "\nReranked Search Results:\n{}",
                    render_facts(reranked)
                ));
            }
            out
        }
    }
}
