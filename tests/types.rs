// ABOUTME: Property tests for stack name validation.
// ABOUTME: Checks the naming rules hold across generated names.

use coreauto::types::{MAX_NAME_LEN, MAX_STACK_NAME_LEN, StackName, StackNameError};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn well_formed_names_are_accepted(name in "[A-Za-z][A-Za-z0-9-]{0,100}") {
        let parsed = StackName::new(&name).expect("valid stack name");
        prop_assert_eq!(parsed.as_str(), name.as_str());
        prop_assert_eq!(parsed.change_set_name(), format!("{name}-change-set"));
    }

    #[test]
    fn names_starting_with_a_non_letter_are_rejected(name in "[0-9-][A-Za-z0-9-]{0,20}") {
        prop_assert_eq!(StackName::new(&name), Err(StackNameError::InvalidStart));
    }

    #[test]
    fn names_with_forbidden_characters_are_rejected(
        head in "[A-Za-z][A-Za-z0-9]{0,10}",
        bad in "[_./: ]",
        tail in "[A-Za-z0-9]{0,10}"
    ) {
        let name = format!("{head}{bad}{tail}");
        let expected = bad.chars().next().map(StackNameError::InvalidChar);
        prop_assert_eq!(StackName::new(&name).err(), expected);
    }

    #[test]
    fn overlong_names_are_rejected(extra in 1_usize..64) {
        let name = format!("a{}", "b".repeat(MAX_NAME_LEN - 1 + extra));
        prop_assert_eq!(StackName::new(&name), Err(StackNameError::TooLong));
    }
}

proptest! {
    #![proptest_config(Config::with_cases(64))]
    #[test]
    fn accepted_names_leave_room_for_the_change_set(len in 1_usize..=MAX_STACK_NAME_LEN) {
        let name = format!("a{}", "b".repeat(len - 1));
        match StackName::new(&name) {
            Ok(parsed) => prop_assert!(parsed.change_set_name().len() <= MAX_STACK_NAME_LEN),
            Err(err) => {
                prop_assert_eq!(err, StackNameError::TooLong);
                prop_assert!(len > MAX_NAME_LEN);
            }
        }
    }
}

#[test]
fn empty_name_is_rejected() {
    assert_eq!(StackName::new(""), Err(StackNameError::Empty));
}
