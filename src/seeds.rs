//! Built-in demo content, so a fresh instance has something to browse.

use crate::config::{CategoryCfg, ExerciseCfg};
use crate::protocol::{ChoiceIn, ChoicesIn, QuestionIn};

fn category(route: &str, name: &str, description: &str) -> CategoryCfg {
  CategoryCfg { route: route.into(), name: name.into(), description: Some(description.into()) }
}

fn choice(name: &str, label: &str, answer: bool) -> ChoiceIn {
  ChoiceIn { name: Some(name.into()), label: Some(label.into()), answer: Some(answer) }
}

/// Parents come before their children.
pub fn demo_categories() -> Vec<CategoryCfg> {
  vec![
    category("", "Pointers", "Addresses, dereferencing and arithmetic."),
    category("Pointers", "Exo 1", "First steps with pointers."),
    category("", "Memory", "Where values live."),
    category("Memory", "Stack", "Frames and automatic storage."),
  ]
}

pub fn demo_exercises() -> Vec<ExerciseCfg> {
  vec![
    ExerciseCfg {
      category: "Pointers_Exo+1".into(),
      name: "Test A".into(),
      description: "Read a pointer declaration.".into(),
      questions: vec![QuestionIn {
        title: Some("What does p hold?".into()),
        statement: Some("Given int x = 3; int *p = &x; what is the value of p?".into()),
        explanation: Some("A pointer holds the address of the object it points to.".into()),
        language: Some("c".into()),
        language_snippet: Some("int x = 3;\nint *p = &x;".into()),
        choices: Some(ChoicesIn {
          format: Some("radio".into()),
          list: vec![choice("a", "3", false), choice("b", "address of x", true)],
        }),
      }],
    },
    ExerciseCfg {
      category: "Memory_Stack".into(),
      name: "Frames".into(),
      description: "Lifetimes of locals.".into(),
      questions: vec![QuestionIn {
        title: Some("Dangling".into()),
        statement: Some("Which of these return a dangling pointer?".into()),
        explanation: Some("Locals die with the frame that holds them.".into()),
        language: Some("cpp".into()),
        language_snippet: None,
        choices: Some(ChoicesIn {
          format: Some("checkbox".into()),
          list: vec![choice("a", "&local", true), choice("b", "new int", false), choice("c", "&static", false)],
        }),
      }],
    },
  ]
}
