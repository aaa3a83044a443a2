//! Property tests for echo stripping and exit detection

use proptest::prelude::*;
use sshdeck_core::{EchoFilter, EchoMode, is_exit_command};

/// Single-line commands as typed at a prompt
fn command_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ./_|-]{1,40}"
}

/// Remote output, including non-ASCII text
fn output_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 \r\n:$#éß✓-]{0,80}"
}

proptest! {
    /// Property: with a fully echoing remote, Full leaves exactly the output
    #[test]
    fn full_echo_recovers_output(cmd in command_strategy(), output in output_strategy()) {
        let sent = format!("{cmd}\n");
        let received = format!("{cmd}\r\n{output}");
        prop_assert_eq!(EchoMode::Full.strip(&sent, &received), output);
    }

    /// Property: Full removes len(sent)+1 characters, never more
    #[test]
    fn full_echo_removes_fixed_char_count(sent in "[a-z ]{0,20}\n", received in output_strategy()) {
        let stripped = EchoMode::Full.strip(&sent, &received);
        let expected = received.chars().count().saturating_sub(sent.chars().count() + 1);
        prop_assert_eq!(stripped.chars().count(), expected);
        prop_assert!(received.ends_with(&stripped));
    }

    /// Property: Partial agrees with Full on a fully echoing remote
    #[test]
    fn partial_matches_full_when_echo_is_complete(cmd in command_strategy(), output in "[a-z0-9 ]{0,40}") {
        let sent = format!("{cmd}\n");
        let received = format!("{cmd}\r\n{output}");
        prop_assert_eq!(
            EchoMode::Partial.strip(&sent, &received),
            EchoMode::Full.strip(&sent, &received)
        );
    }

    /// Property: None is the identity
    #[test]
    fn no_echo_is_identity(sent in command_strategy(), received in output_strategy()) {
        prop_assert_eq!(EchoMode::None.strip(&sent, &received), received);
    }

    /// Property: Partial only ever removes a prefix
    #[test]
    fn partial_returns_a_suffix(sent in command_strategy(), received in output_strategy()) {
        let stripped = EchoMode::Partial.strip(&sent, &received);
        prop_assert!(received.ends_with(&stripped));
    }

    /// Property: exit and quit are recognized in any letter case
    #[test]
    fn exit_words_any_case(word in prop::sample::select(vec!["exit", "quit"]), mask in any::<u8>()) {
        let mixed: String = word
            .chars()
            .enumerate()
            .map(|(i, c)| if mask & (1 << i) == 0 { c } else { c.to_ascii_uppercase() })
            .collect();
        prop_assert!(is_exit_command(&mixed));
    }

    /// Property: nothing else ends the session
    #[test]
    fn other_lines_do_not_exit(line in "[a-z ]{0,12}") {
        prop_assume!(line != "exit" && line != "quit");
        prop_assert!(!is_exit_command(&line));
    }
}
