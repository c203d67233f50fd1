use crate::models::{AudioAnalysisRequest, LessonRequest};

pub const LESSON: &str = include_str!("../data/prompts/lesson.txt");
pub const PRONUNCIATION: &str = include_str!("../data/prompts/pronunciation.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass over the template, so values are inserted
/// verbatim even when they themselves contain `{{...}}`. Unknown placeholders
/// are left untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let substitution = after.find("}}").and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });

        match substitution {
            Some((value, end)) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

pub fn lesson_prompt(request: &LessonRequest) -> String {
    render(
        LESSON,
        &[
            ("topic", &request.topic),
            ("level", &request.level),
            ("lang", request.lang().display_label()),
        ],
    )
}

pub fn pronunciation_prompt(request: &AudioAnalysisRequest) -> String {
    render(
        PRONUNCIATION,
        &[
            ("target_text", &request.target_text),
            ("target_pinyin", &request.target_pinyin),
            ("lang", request.lang().display_label()),
        ],
    )
}
