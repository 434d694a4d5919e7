use crate::models::RetrievedPassage;

pub const DEFAULT_CONTEXT_BUDGET: usize = 6_000;

pub const INSUFFICIENT_INFORMATION: &str =
    "I could not find relevant passages in the indexed legal documents to answer this question. \
     Please rephrase, or consult a lawyer for advice.";

// Builds the context block fed to generation: passages in relevance order,
// each under a source attribution header. A passage that would overflow the
// budget is dropped whole; partial sentences are never fed as ground truth.
pub fn format_context(passages: &[RetrievedPassage], max_chars: usize) -> String {
    let mut context = String::new();
    let mut used = 0usize;

    for passage in passages {
        let block = format!("[{}]\n{}", passage.file_name, passage.text);
        let separator = if context.is_empty() { 0 } else { 2 };
        let cost = block.chars().count() + separator;

        if used + cost > max_chars {
            break;
        }

        if !context.is_empty() {
            context.push_str("\n\n");
        }
        context.push_str(&block);
        used += cost;
    }

    context
}
