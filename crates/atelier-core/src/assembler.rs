//! Reply assembly.
//!
//! Builds the human-readable summary returned after a turn. Pure and
//! deterministic: the same prompt and change list always produce the same
//! string.

/// Assembles the summary shown to the user once a turn's generation starts.
///
/// States the refined request, enumerates the adjustments made this turn (if
/// any), and signals that generation is under way.
pub fn assemble_reply(prompt: &str, changes: &[String]) -> String {
    let mut reply = format!("Here's the new take: \"{prompt}\"");

    if !changes.is_empty() {
        reply.push_str("\n\nAdjustments this turn:");
        for change in changes {
            reply.push_str("\n- ");
            reply.push_str(change);
        }
    }

    reply.push_str("\n\nGenerating now...");
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_without_changes() {
        let reply = assemble_reply("a red fox in the snow", &[]);

        assert!(reply.contains("a red fox in the snow"));
        assert!(!reply.contains("Adjustments"));
        assert!(reply.ends_with("Generating now..."));
    }

    #[test]
    fn test_reply_enumerates_changes_in_order() {
        let changes = vec![
            "Raised refinement steps to 40 for more detail.".to_string(),
            "Tightened prompt guidance to 8.5 to stay on subject.".to_string(),
        ];
        let reply = assemble_reply("a red fox in the snow", &changes);

        let steps_pos = reply.find("Raised refinement steps").unwrap();
        let guidance_pos = reply.find("Tightened prompt guidance").unwrap();
        assert!(steps_pos < guidance_pos);
    }

    #[test]
    fn test_reply_is_deterministic() {
        let changes = vec!["Lowered refinement steps to 20 for a faster turnaround.".to_string()];
        assert_eq!(
            assemble_reply("p", &changes),
            assemble_reply("p", &changes)
        );
    }
}
