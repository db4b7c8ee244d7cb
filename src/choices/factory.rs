//! Rendering of choices into outbound activities

use super::channel;
use super::Choice;
use crate::activity::{Activity, CardAction, SuggestedActions};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Separators and numbering used by inline and list rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceFactoryOptions {
    pub inline_separator: String,
    /// Between the only two choices
    pub inline_or: String,
    /// Before the last of three or more choices
    pub inline_or_more: String,
    pub include_numbers: bool,
}

impl Default for ChoiceFactoryOptions {
    fn default() -> Self {
        Self {
            inline_separator: ", ".to_string(),
            inline_or: " or ".to_string(),
            inline_or_more: ", or ".to_string(),
            include_numbers: true,
        }
    }
}

/// Builds prompt activities that present a set of choices
pub struct ChoiceFactory;

impl ChoiceFactory {
    /// Pick the richest rendering the channel supports.
    ///
    /// Suggested actions when titles are short and the channel has them,
    /// inline for up to three short choices, a list otherwise.
    pub fn for_channel(
        channel_id: &str,
        choices: &[Choice],
        text: Option<&str>,
        speak: Option<&str>,
        options: &ChoiceFactoryOptions,
    ) -> Activity {
        let max_title_length = choices
            .iter()
            .map(|c| c.title().chars().count())
            .max()
            .unwrap_or(0);
        let long_titles = max_title_length > channel::MAX_ACTION_TITLE_LENGTH;

        if !long_titles && channel::supports_suggested_actions(channel_id, choices.len()) {
            Self::suggested_action(choices, text, speak)
        } else if !long_titles && choices.len() <= 3 {
            Self::inline(choices, text, speak, options)
        } else {
            Self::list(choices, text, speak, options)
        }
    }

    /// "text (1) red, (2) green, or (3) blue"
    pub fn inline(
        choices: &[Choice],
        text: Option<&str>,
        speak: Option<&str>,
        options: &ChoiceFactoryOptions,
    ) -> Activity {
        let mut txt = format!("{} ", text.unwrap_or_default());
        let mut connector = "";
        for (index, choice) in choices.iter().enumerate() {
            txt.push_str(connector);
            if options.include_numbers {
                let _ = write!(txt, "({}) ", index + 1);
            }
            txt.push_str(choice.title());

            connector = if index + 2 == choices.len() {
                if index == 0 {
                    options.inline_or.as_str()
                } else {
                    options.inline_or_more.as_str()
                }
            } else {
                options.inline_separator.as_str()
            };
        }

        with_speak(Activity::message(txt.trim()), speak)
    }

    /// One choice per line, numbered or bulleted
    pub fn list(
        choices: &[Choice],
        text: Option<&str>,
        speak: Option<&str>,
        options: &ChoiceFactoryOptions,
    ) -> Activity {
        let mut txt = text.unwrap_or_default().to_string();
        let mut connector = "\n\n   ";
        for (index, choice) in choices.iter().enumerate() {
            txt.push_str(connector);
            if options.include_numbers {
                let _ = write!(txt, "{}. ", index + 1);
            } else {
                txt.push_str("- ");
            }
            txt.push_str(choice.title());
            connector = "\n   ";
        }

        with_speak(Activity::message(txt.trim_start()), speak)
    }

    /// Text plus one suggested action per choice
    pub fn suggested_action(
        choices: &[Choice],
        text: Option<&str>,
        speak: Option<&str>,
    ) -> Activity {
        let mut activity = Activity::message(text.unwrap_or_default());
        activity.suggested_actions = Some(SuggestedActions {
            actions: Self::to_actions(choices),
        });
        with_speak(activity, speak)
    }

    pub fn to_actions(choices: &[Choice]) -> Vec<CardAction> {
        choices
            .iter()
            .map(|c| {
                c.action
                    .clone()
                    .unwrap_or_else(|| CardAction::im_back(&c.value, &c.value))
            })
            .collect()
    }
}

fn with_speak(mut activity: Activity, speak: Option<&str>) -> Activity {
    activity.speak = speak.map(String::from);
    activity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Vec<Choice> {
        Choice::from_values(["red", "green", "blue"])
    }

    #[test]
    fn test_inline() {
        let options = ChoiceFactoryOptions::default();
        let activity = ChoiceFactory::inline(&colors(), Some("select from:"), None, &options);
        assert_eq!(activity.text(), "select from: (1) red, (2) green, or (3) blue");
    }

    #[test]
    fn test_inline_two_choices() {
        let choices = Choice::from_values(["Yes", "No"]);
        let options = ChoiceFactoryOptions::default();
        let activity = ChoiceFactory::inline(&choices, Some("Continue?"), None, &options);
        assert_eq!(activity.text(), "Continue? (1) Yes or (2) No");
    }

    #[test]
    fn test_inline_without_numbers_or_text() {
        let options = ChoiceFactoryOptions {
            include_numbers: false,
            ..ChoiceFactoryOptions::default()
        };
        let activity = ChoiceFactory::inline(&colors(), None, None, &options);
        assert_eq!(activity.text(), "red, green, or blue");
    }

    #[test]
    fn test_list() {
        let options = ChoiceFactoryOptions::default();
        let activity = ChoiceFactory::list(&colors(), Some("select from:"), None, &options);
        assert_eq!(
            activity.text(),
            "select from:\n\n   1. red\n   2. green\n   3. blue"
        );
    }

    #[test]
    fn test_list_bulleted() {
        let options = ChoiceFactoryOptions {
            include_numbers: false,
            ..ChoiceFactoryOptions::default()
        };
        let activity = ChoiceFactory::list(&colors(), Some("pick"), Some("pick one"), &options);
        assert_eq!(activity.text(), "pick\n\n   - red\n   - green\n   - blue");
        assert_eq!(activity.speak.as_deref(), Some("pick one"));
    }

    #[test]
    fn test_suggested_action() {
        let activity = ChoiceFactory::suggested_action(&colors(), Some("select from:"), None);
        assert_eq!(activity.text(), "select from:");
        let actions = activity.suggested_actions.unwrap().actions;
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], CardAction::im_back("red", "red"));
    }

    #[test]
    fn test_for_channel() {
        let options = ChoiceFactoryOptions::default();

        let activity =
            ChoiceFactory::for_channel("webchat", &colors(), Some("pick"), None, &options);
        assert!(activity.suggested_actions.is_some());

        let activity =
            ChoiceFactory::for_channel("console", &colors(), Some("pick"), None, &options);
        assert!(activity.suggested_actions.is_none());
        assert_eq!(activity.text(), "pick (1) red, (2) green, or (3) blue");

        let many = Choice::from_values(["a", "b", "c", "d"]);
        let activity = ChoiceFactory::for_channel("console", &many, Some("pick"), None, &options);
        assert!(activity.text().starts_with("pick\n\n   1. a"));

        let long = Choice::from_values(["an extremely long choice title"]);
        let activity = ChoiceFactory::for_channel("webchat", &long, Some("pick"), None, &options);
        assert!(activity.suggested_actions.is_none());
        assert!(activity.text().contains("1. an extremely long choice title"));
    }
}
