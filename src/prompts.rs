//! Prompt templates for the agent layer.
//!
//! Two pure, stateless template functions. They are exposed both to the
//! backends (which reuse the parser prompt for extraction) and as MCP
//! prompts (`parser_text_prompt`, `agent_query_prompt`) via [`crate::mcp`].

/// Instructional prompt for relationship extraction.
///
/// When `text` is present it is interpolated at the end; when absent the
/// returned skeleton is still a complete, valid instruction block.
pub fn parser_prompt(text: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a precise knowledge-graph extractor. Read the input text and \
         extract every entity and every relationship between entities.\n\
         Respond with a single JSON object and nothing else, using exactly this shape:\n\
         {\n\
           \"nodes\": { \"<node id>\": \"<node label>\" },\n\
           \"relationships\": [\n\
             { \"source\": \"<node id>\", \"target\": \"<node id>\", \"relation\": \"<relation label>\" }\n\
           ]\n\
         }\n\
         Rules:\n\
         - Node ids are short, lowercase, unique identifiers.\n\
         - Every relationship's source and target must appear as keys in nodes.\n\
         - Do not invent entities that are not in the text.\n\
         - If no relationships are present, return empty nodes and relationships.",
    );
    if let Some(text) = text {
        prompt.push_str("\n\nText:\n");
        prompt.push_str(text);
    }
    prompt
}

/// Instructional prompt directing an agent to answer `user_query` using only
/// the supplied textual graph representations.
pub fn query_prompt(nodes_str: &str, edges_str: &str, user_query: &str) -> String {
    format!(
        "You are a knowledge-graph assistant. Answer the user's question using \
         ONLY the graph context below. Do not use outside knowledge. If the \
         graph does not contain the answer, say so explicitly.\n\n\
         Nodes:\n{nodes_str}\n\n\
         Edges:\n{edges_str}\n\n\
         Question: {user_query}\n\n\
         Answer concisely, citing the node and edge labels you relied on."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_prompt_interpolates_text() {
        let prompt = parser_prompt(Some("Alice works at Acme."));
        assert!(prompt.contains("Alice works at Acme."));
        assert!(prompt.contains("\"nodes\""));
        assert!(prompt.contains("\"relationships\""));
    }

    #[test]
    fn parser_prompt_skeleton_without_text() {
        let prompt = parser_prompt(None);
        assert!(prompt.contains("knowledge-graph extractor"));
        assert!(!prompt.contains("Text:\n"));
    }

    // Round-trip property: all three inputs survive verbatim in the output.
    #[test]
    fn query_prompt_contains_inputs_verbatim() {
        let prompt = query_prompt("A->B", "A-knows-B", "who knows B?");
        assert!(prompt.contains("A->B"));
        assert!(prompt.contains("A-knows-B"));
        assert!(prompt.contains("who knows B?"));
        assert!(prompt.contains("ONLY the graph context"));
    }
}
