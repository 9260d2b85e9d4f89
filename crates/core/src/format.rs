use crate::quiz::{QuestionKind, QuizQuestion, QuizResult};
use crate::tree::{NodeId, Tree};
use crate::types::{ChatMessage, Sender};

pub const CAPTIONS_PER_PAGE: usize = 5;

pub fn total_pages(captions: &[String]) -> usize {
    captions.len().div_ceil(CAPTIONS_PER_PAGE)
}

/// One 1-based page of captions, blank-line separated. Out-of-range pages are empty.
pub fn caption_page(captions: &[String], page: usize) -> String {
    let Some(offset) = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(CAPTIONS_PER_PAGE))
    else {
        return String::new();
    };
    captions
        .iter()
        .skip(offset)
        .take(CAPTIONS_PER_PAGE)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Children of `folder`, folders first. Each line carries the child's index
/// within the folder, which is what rename and delete take.
pub fn format_listing(tree: &Tree, folder: NodeId) -> String {
    let children: Vec<_> = tree
        .children(folder)
        .iter()
        .enumerate()
        .filter_map(|(index, id)| tree.get(*id).map(|node| (index, node)))
        .collect();

    let folders = children.iter().filter(|(_, node)| node.is_folder());
    let files = children.iter().filter(|(_, node)| !node.is_folder());

    folders
        .map(|(index, node)| format!("{:>3}  [dir] {}", index, node.name))
        .chain(files.map(|(index, node)| format!("{:>3}  [txt] {}", index, node.name)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_history(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| match m.sender {
            Sender::User => format!("You: {}", m.text),
            Sender::Bot => format!("Bot: {}", m.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_quiz_question(number: usize, question: &QuizQuestion) -> String {
    let mut output = format!("{}. {}\n", number, question.question);
    match question.kind {
        QuestionKind::Mcq => {
            for (i, option) in question.options.iter().enumerate() {
                let label = char::from(b'a' + (i % 26) as u8);
                output.push_str(&format!("   {}) {}\n", label, option));
            }
        }
        QuestionKind::TrueFalse => output.push_str("   true / false\n"),
    }
    output
}

/// Shown right after a quiz answer is recorded.
pub fn format_answer_feedback(question: &QuizQuestion, correct: bool) -> String {
    if correct {
        "Correct!".to_string()
    } else {
        format!("Incorrect. The correct answer is: {}", question.correct_answer)
    }
}

pub fn format_quiz_result(result: &QuizResult) -> String {
    let mut output = format!(
        "Score: {}/{} ({:.1}%)",
        result.score, result.total, result.percentage
    );
    if !result.message.is_empty() {
        output.push('\n');
        output.push_str(&result.message);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Answer;
    use crate::types::Item;

    fn captions(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {}", i)).collect()
    }

    #[test]
    fn pages_hold_five_captions() {
        let all = captions(7);
        assert_eq!(total_pages(&all), 2);
        assert_eq!(
            caption_page(&all, 1),
            "line 1\n\nline 2\n\nline 3\n\nline 4\n\nline 5"
        );
        assert_eq!(caption_page(&all, 2), "line 6\n\nline 7");
        assert_eq!(caption_page(&all, 3), "");
        assert_eq!(caption_page(&all, 0), "");
    }

    #[test]
    fn huge_page_numbers_are_out_of_range() {
        let all = captions(3);
        assert_eq!(caption_page(&all, usize::MAX), "");
        assert_eq!(caption_page(&all, usize::MAX / CAPTIONS_PER_PAGE + 1), "");
    }

    #[test]
    fn listing_puts_folders_first_and_keeps_indices() {
        let root = Item::Folder {
            name: "Root".to_string(),
            children: vec![
                Item::File {
                    name: "Notes.txt".to_string(),
                    content: Some("x".to_string()),
                    video_id: None,
                },
                Item::Folder {
                    name: "Physics".to_string(),
                    children: vec![],
                },
            ],
        };
        let tree = Tree::from_item(&root).unwrap();
        assert_eq!(
            format_listing(&tree, tree.root()),
            "  1  [dir] Physics\n  0  [txt] Notes.txt"
        );
    }

    #[test]
    fn history_labels_each_side() {
        let messages = vec![ChatMessage::user("Why?"), ChatMessage::bot("Because.")];
        assert_eq!(format_history(&messages), "You: Why?\n\nBot: Because.");
    }

    #[test]
    fn mcq_options_are_lettered() {
        let q = QuizQuestion {
            kind: QuestionKind::Mcq,
            question: "Pick".to_string(),
            options: vec!["x".to_string(), "y".to_string()],
            correct_answer: Answer::Text("y".to_string()),
        };
        assert_eq!(format_quiz_question(1, &q), "1. Pick\n   a) x\n   b) y\n");
    }

    #[test]
    fn answer_feedback_names_the_correct_answer() {
        let q = QuizQuestion {
            kind: QuestionKind::TrueFalse,
            question: "Is water wet?".to_string(),
            options: vec![],
            correct_answer: Answer::Bool(true),
        };
        assert_eq!(format_answer_feedback(&q, true), "Correct!");
        assert_eq!(
            format_answer_feedback(&q, false),
            "Incorrect. The correct answer is: true"
        );
    }

    #[test]
    fn quiz_result_includes_message() {
        let result = QuizResult {
            score: 3,
            total: 4,
            percentage: 75.0,
            message: "Nice work!".to_string(),
        };
        assert_eq!(format_quiz_result(&result), "Score: 3/4 (75.0%)\nNice work!");
    }
}
