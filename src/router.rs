//! Turns a submission into an extraction input, and an extraction result into
//! the message that gets posted.

use crate::extractor::{ExtractionInput, SubmissionKind};
use crate::platform::IncomingMessage;

/// Exact reply the prompt asks the model to give when nothing is found.
pub const NOT_FOUND_SENTINEL: &str = "No IDP found.";

pub const ROOM_ID_MARKER: &str = "Room ID";
pub const PASSWORD_MARKER: &str = "Password";

/// Filename suffixes treated as screenshots (matched case-insensitively).
const IMAGE_SUFFIXES: [&str; 3] = ["png", "jpg", "jpeg"];

pub const COULD_NOT_PROCESS: &str = "Could not process your submission.";

/// What an extraction result means for the submitter.
#[derive(Debug, Clone, PartialEq)]
enum Verdict<'a> {
    /// Both markers present; the text is announced verbatim.
    Credentials(&'a str),
    NotFound,
    /// Anything else, including `"Error: ..."` strings from the extractor.
    Failed(&'a str),
    /// No input was usable or the model returned nothing.
    Unprocessable,
}

/// Where the outcome of a submission goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Announce { channel_id: u64, text: String },
    /// Back to the channel the submission came from.
    Reply { text: String },
}

pub fn is_image_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Pick what to extract from: the first image attachment, otherwise the text.
pub fn select_input(msg: &IncomingMessage) -> Option<ExtractionInput> {
    if let Some(attachment) = msg
        .attachments
        .iter()
        .find(|a| is_image_filename(&a.filename))
    {
        return Some(ExtractionInput::Image {
            url: attachment.url.clone(),
        });
    }

    if !msg.content.trim().is_empty() {
        return Some(ExtractionInput::Text(msg.content.clone()));
    }

    None
}

fn classify(output: Option<&str>) -> Verdict<'_> {
    match output {
        None | Some("") => Verdict::Unprocessable,
        Some(text) if text.contains(ROOM_ID_MARKER) && text.contains(PASSWORD_MARKER) => {
            Verdict::Credentials(text)
        }
        Some(NOT_FOUND_SENTINEL) => Verdict::NotFound,
        Some(text) => Verdict::Failed(text),
    }
}

pub fn acknowledgement(kind: SubmissionKind, input: &ExtractionInput, provider: &str) -> String {
    format!("Analyzing {} {} with {}...", kind, input.source(), provider)
}

pub fn announcement(kind: SubmissionKind, credentials: &str) -> String {
    format!(
        "**BGMI {} Room Details**\n\n{}\n\nJoin the custom room ASAP before it gets full!",
        kind, credentials
    )
}

/// Decide the delivery for an extraction result.
pub fn route(kind: SubmissionKind, post_channel_id: u64, output: Option<&str>) -> Delivery {
    match classify(output) {
        Verdict::Credentials(text) => Delivery::Announce {
            channel_id: post_channel_id,
            text: announcement(kind, text),
        },
        Verdict::NotFound => Delivery::Reply {
            text: format!(
                "No valid Room ID & Password found in your {} submission.",
                kind.label().to_lowercase()
            ),
        },
        Verdict::Failed(text) => Delivery::Reply {
            text: format!("Error processing your submission: {}", text),
        },
        Verdict::Unprocessable => Delivery::Reply {
            text: COULD_NOT_PROCESS.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Attachment;

    fn message(content: &str, files: &[&str]) -> IncomingMessage {
        IncomingMessage {
            author_id: 7,
            author_is_bot: false,
            guild_id: Some(1),
            channel_id: 111,
            content: content.to_string(),
            attachments: files
                .iter()
                .map(|name| Attachment {
                    url: format!("https://cdn.example/{name}"),
                    filename: name.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_image_suffixes() {
        assert!(is_image_filename("room.png"));
        assert!(is_image_filename("ROOM.JPG"));
        assert!(is_image_filename("shot.Jpeg"));
        assert!(!is_image_filename("notes.txt"));
        assert!(!is_image_filename("clip.gif"));
    }

    #[test]
    fn test_first_image_wins_over_text() {
        let msg = message("Room ID: 1 Password: x", &["notes.txt", "a.jpg", "b.png"]);
        assert_eq!(
            select_input(&msg),
            Some(ExtractionInput::Image {
                url: "https://cdn.example/a.jpg".into()
            })
        );
    }

    #[test]
    fn test_non_image_attachments_fall_back_to_text() {
        let msg = message(" id 5 pw 6 ", &["notes.txt"]);
        assert_eq!(
            select_input(&msg),
            Some(ExtractionInput::Text(" id 5 pw 6 ".into()))
        );
    }

    #[test]
    fn test_blank_message_has_no_input() {
        assert_eq!(select_input(&message("  \n ", &["clip.gif"])), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(Some("Room ID: 1\nPassword: 2")),
            Verdict::Credentials("Room ID: 1\nPassword: 2")
        );
        assert_eq!(classify(Some("No IDP found.")), Verdict::NotFound);
        assert_eq!(classify(Some("No IDP found")), Verdict::Failed("No IDP found"));
        assert_eq!(classify(Some("Room ID: 1")), Verdict::Failed("Room ID: 1"));
        assert_eq!(classify(Some("")), Verdict::Unprocessable);
        assert_eq!(classify(None), Verdict::Unprocessable);
    }

    #[test]
    fn test_route_announces_credentials_verbatim() {
        let delivery = route(
            SubmissionKind::Scrim,
            222,
            Some("Room ID: 5551234\nPassword: hunter2"),
        );
        assert_eq!(
            delivery,
            Delivery::Announce {
                channel_id: 222,
                text: "**BGMI Scrim Room Details**\n\nRoom ID: 5551234\nPassword: hunter2\n\n\
                       Join the custom room ASAP before it gets full!"
                    .into()
            }
        );
    }

    #[test]
    fn test_route_not_found_uses_lowercase_kind() {
        assert_eq!(
            route(SubmissionKind::Tournament, 444, Some(NOT_FOUND_SENTINEL)),
            Delivery::Reply {
                text: "No valid Room ID & Password found in your tournament submission.".into()
            }
        );
    }

    #[test]
    fn test_route_errors_and_sentinels_are_replied() {
        assert_eq!(
            route(SubmissionKind::Scrim, 222, Some("Error: timed out")),
            Delivery::Reply {
                text: "Error processing your submission: Error: timed out".into()
            }
        );
        assert_eq!(
            route(SubmissionKind::Scrim, 222, Some("No input provided.")),
            Delivery::Reply {
                text: "Error processing your submission: No input provided.".into()
            }
        );
        assert_eq!(
            route(SubmissionKind::Scrim, 222, None),
            Delivery::Reply {
                text: COULD_NOT_PROCESS.into()
            }
        );
    }

    #[test]
    fn test_acknowledgement() {
        let input = ExtractionInput::Text("x".into());
        assert_eq!(
            acknowledgement(SubmissionKind::Tournament, &input, "Gemini AI"),
            "Analyzing Tournament text with Gemini AI..."
        );
    }
}
