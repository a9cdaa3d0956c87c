//! Instruction texts sent as the `system` message of each chat call.

/// Extraction instructions for the analysis pass.
pub const ANALYZE_SYSTEM_PROMPT: &str = r#"You extract the visual elements of an image request. The request may be written in any language; always answer in English.

Return ONLY a JSON object with these keys:
- "subjects": array of the main characters or things, as singular English nouns (required, never empty)
- "setting": where the scene takes place, or null
- "activity": what the subjects are doing, or null
- "clothing": what the subjects wear, or null
- "objects": array of the other things in the scene, or null
- "decor": background or decorative details, or null

Add any of these keys only when the request mentions them: "mood", "time_of_day", "weather", "ability", "companion", "size", "quantity".
Never invent an element the request does not mention. Use null for every absent key.

Examples:
Request: un lapin
{"subjects":["rabbit"],"setting":null,"activity":null,"clothing":null,"objects":null,"decor":null}

Request: deux chats qui dorment sur un canapé la nuit
{"subjects":["cat"],"setting":"living room","activity":"sleeping","clothing":null,"objects":["sofa"],"decor":null,"time_of_day":"night","quantity":"two"}

Request: a tiny dragon wearing a scarf flies over a snowy village with its owl friend
{"subjects":["dragon"],"setting":"village","activity":"flying","clothing":"scarf","objects":null,"decor":null,"weather":"snow","size":"tiny","companion":"owl"}"#;

/// Sentence synthesis instructions for the second pass of two-pass mode.
pub const SYNTHESIZE_SYSTEM_PROMPT: &str = r#"You write prompts for an image generator. You receive a JSON object listing the elements of a scene.

Write ONE English sentence that:
- includes every element present in the JSON (skip keys whose value is null);
- adds exactly one emotion or feeling for the subjects, such as joyful, curious or peaceful;
- never uses color, texture or material words (no red, blue, green, grey, golden, wooden, fluffy, shiny, velvet, ...);
- never adds a subject, object or place that is not in the JSON.

Answer with the sentence only, without quotes or explanations.

Examples:
Elements: {"subjects":["rabbit"],"setting":null,"activity":null,"clothing":null,"objects":null,"decor":null}
A curious rabbit sits quietly.

Elements: {"subjects":["cat"],"setting":"living room","activity":"sleeping","clothing":null,"objects":["sofa"],"decor":null,"time_of_day":"night","quantity":"two"}
Two peaceful cats sleep on a sofa in a living room at night."#;

/// User message of the synthesis pass. `{elements}` receives the compact element JSON.
pub const SYNTHESIZE_USER_TEMPLATE: &str = "Elements: {elements}";

/// Default instructions for single-pass enrichment straight from the user's prompt.
pub const DEFAULT_ENRICH_SYSTEM_PROMPT: &str = r#"You turn short image requests into one descriptive English sentence for an image generator.

Rules:
- Translate the request into English when it is written in another language.
- If the request already names a setting, clothing, pose or activity, keep those details exactly as given (translated) and do not replace them with another scene.
- Only when the request names nothing but its subject, add a simple fitting setting and activity.
- Never use color, texture or material words (no red, blue, green, grey, golden, wooden, fluffy, shiny, velvet, ...).
- Write exactly one sentence.
- Respond only in English, with the sentence alone and no quotes or explanations.

Examples:
Request: un chat
A playful cat stretches on a windowsill in the afternoon.

Request: une fille en robe qui danse sous la pluie
A girl in a dress dances happily in the rain."#;

/// Words the enrichment instructions forbid. Used to flag replies that ignored them.
pub const FORBIDDEN_DESCRIPTORS: &[&str] = &[
    "red", "blue", "green", "grey", "gray", "yellow", "orange", "purple", "pink", "brown",
    "black", "white", "golden", "silver", "wooden", "metallic", "fluffy", "furry", "shiny",
    "velvet", "silky", "leather",
];

pub fn synthesize_user_message(elements_json: &str) -> String {
    SYNTHESIZE_USER_TEMPLATE.replace("{elements}", elements_json)
}

/// Forbidden descriptors appearing as whole words in `text`, case-insensitively.
pub fn forbidden_descriptors_in(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    FORBIDDEN_DESCRIPTORS
        .iter()
        .copied()
        .filter(|forbidden| words.contains(forbidden))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CORE_CATEGORIES, EXTENDED_CATEGORIES};

    #[test]
    fn analysis_prompt_names_every_category() {
        assert!(ANALYZE_SYSTEM_PROMPT.contains(r#""subjects""#));
        for category in CORE_CATEGORIES.iter().chain(EXTENDED_CATEGORIES.iter()) {
            assert!(
                ANALYZE_SYSTEM_PROMPT.contains(&format!("\"{}\"", category)),
                "{}",
                category
            );
        }
    }

    #[test]
    fn user_message_embeds_elements() {
        assert_eq!(
            synthesize_user_message(r#"{"subjects":["owl"]}"#),
            r#"Elements: {"subjects":["owl"]}"#
        );
    }

    #[test]
    fn analysis_example_matches_documented_output() {
        assert!(ANALYZE_SYSTEM_PROMPT.contains(
            r#"{"subjects":["rabbit"],"setting":null,"activity":null,"clothing":null,"objects":null,"decor":null}"#
        ));
    }

    #[test]
    fn worked_examples_respect_the_descriptor_ban() {
        for example in [
            "A curious rabbit sits quietly.",
            "Two peaceful cats sleep on a sofa in a living room at night.",
            "A playful cat stretches on a windowsill in the afternoon.",
            "A girl in a dress dances happily in the rain.",
        ] {
            assert!(forbidden_descriptors_in(example).is_empty(), "{}", example);
        }
    }

    #[test]
    fn flags_whole_words_only() {
        assert_eq!(
            forbidden_descriptors_in("A Red fox naps beside a bluebell."),
            vec!["red"]
        );
        assert!(forbidden_descriptors_in("The fox is redolent of pine.").is_empty());
    }
}
