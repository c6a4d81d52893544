//! Field validators.
//!
//! Each validator is a small struct with a fixed interface: it takes the raw
//! value, sanitizes it (escape, trim) and either returns the cleaned value or a
//! field-tagged [`FieldError`]. Request-level checks are plain compositions of
//! these structs, collected with [`Collector`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Choice, ChoiceFormat, Choices, Language, QuestionDraft};
use crate::error::{FieldError, Location};
use crate::protocol::{ChoicesIn, QuestionIn};
use crate::uri::{decode, UriParts, EXERCISE_SEP};
use crate::util::{collapse_spaces, escape_html};

pub const NAME_MAX_LENGTH: usize = 30;
pub const TITLE_MAX_LENGTH: usize = 60;
pub const STATEMENT_MAX_LENGTH: usize = 255;
pub const EXPLANATION_MAX_LENGTH: usize = 255;
pub const SNIPPET_MAX_LENGTH: usize = 1000;
pub const CHOICE_FIELD_MAX_LENGTH: usize = 15;

pub static NAME_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[a-zA-Z0-9 _+-]{1,30}$").expect("name pattern compiles"));
pub static ROUTE_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^([A-Za-z0-9+]+(_[A-Za-z0-9+]+)*)?$").expect("route pattern compiles"));
pub static URI_NAME_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[A-Za-z0-9+]+$").expect("uri name pattern compiles"));
pub static TITLE_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[\w ?!^.{}\[\]#_,+-]{1,60}$").expect("title pattern compiles"));

pub trait Validate {
  type Input: ?Sized;
  type Output;

  fn validate(&self, value: &Self::Input) -> Result<Self::Output, FieldError>;
}

/// User-facing Category or Exercise name.
pub struct NameValidator {
  pub field: &'static str,
  pub location: Location,
}

impl NameValidator {
  pub fn body(field: &'static str) -> Self {
    Self { field, location: Location::Body }
  }
}

impl Validate for NameValidator {
  type Input = str;
  type Output = String;

  fn validate(&self, value: &str) -> Result<String, FieldError> {
    let v = collapse_spaces(escape_html(value).trim());
    if v.is_empty() {
      return Err(FieldError::new(self.field, "name too short", self.location));
    }
    if v.chars().count() > NAME_MAX_LENGTH {
      return Err(FieldError::new(self.field, "name too long", self.location));
    }
    if !NAME_RE.is_match(&v) {
      return Err(FieldError::new(self.field, "invalid characters", self.location));
    }
    Ok(v)
  }
}

/// Encoded Category route: segments joined by `_`, possibly empty.
pub struct RouteValidator {
  pub field: &'static str,
  pub location: Location,
}

impl RouteValidator {
  pub fn body(field: &'static str) -> Self {
    Self { field, location: Location::Body }
  }

  pub fn params(field: &'static str) -> Self {
    Self { field, location: Location::Params }
  }
}

impl Validate for RouteValidator {
  type Input = str;
  type Output = String;

  fn validate(&self, value: &str) -> Result<String, FieldError> {
    let v = value.trim();
    if !ROUTE_RE.is_match(v) {
      return Err(FieldError::new(self.field, "invalid characters", self.location));
    }
    Ok(v.to_string())
  }
}

/// A single identifier segment, as found in the `:uriName` path parameter.
pub struct UriNameValidator {
  pub field: &'static str,
}

impl Validate for UriNameValidator {
  type Input = str;
  type Output = String;

  fn validate(&self, value: &str) -> Result<String, FieldError> {
    if !URI_NAME_RE.is_match(value) {
      return Err(FieldError::new(self.field, "invalid characters", Location::Params));
    }
    Ok(value.to_string())
  }
}

/// `<category uri>/<uriName>`; yields the two halves.
pub struct ExerciseUriValidator {
  pub field: &'static str,
  pub location: Location,
}

impl Validate for ExerciseUriValidator {
  type Input = str;
  type Output = UriParts;

  fn validate(&self, value: &str) -> Result<UriParts, FieldError> {
    let parts = decode(value.trim(), EXERCISE_SEP);
    if parts.route.is_empty() || !ROUTE_RE.is_match(&parts.route) || !URI_NAME_RE.is_match(&parts.uri_name) {
      return Err(FieldError::new(self.field, "invalid exercise uri", self.location));
    }
    Ok(parts)
  }
}

/// Free text with a maximum length, optionally required.
pub struct TextValidator {
  pub field: &'static str,
  pub max: usize,
  pub required: bool,
}

impl Validate for TextValidator {
  type Input = str;
  type Output = String;

  fn validate(&self, value: &str) -> Result<String, FieldError> {
    let v = escape_html(value.trim());
    if self.required && v.is_empty() {
      return Err(FieldError::body(self.field, format!("{} too short", self.field)));
    }
    if v.chars().count() > self.max {
      return Err(FieldError::body(self.field, format!("{} too long", self.field)));
    }
    Ok(v)
  }
}

pub struct TitleValidator;

impl Validate for TitleValidator {
  type Input = str;
  type Output = String;

  fn validate(&self, value: &str) -> Result<String, FieldError> {
    let v = escape_html(value.trim());
    if v.chars().count() > TITLE_MAX_LENGTH || !TITLE_RE.is_match(&v) {
      return Err(FieldError::body("title", "invalid title"));
    }
    Ok(v)
  }
}

/// Choice list of a question. A `radio` list needs exactly one right answer.
pub struct ChoicesValidator;

impl Validate for ChoicesValidator {
  type Input = ChoicesIn;
  type Output = Choices;

  fn validate(&self, value: &ChoicesIn) -> Result<Choices, FieldError> {
    let format = match value.format.as_deref().map(str::to_lowercase).as_deref() {
      None | Some("checkbox") => ChoiceFormat::Checkbox,
      Some("radio") => ChoiceFormat::Radio,
      Some(_) => return Err(FieldError::body("choices", "invalid choices format")),
    };
    let short_text = |raw: &Option<String>, what: &str| -> Result<String, FieldError> {
      let v = escape_html(raw.as_deref().unwrap_or("").trim());
      if v.is_empty() || v.chars().count() > CHOICE_FIELD_MAX_LENGTH {
        return Err(FieldError::body("choices", format!("invalid choice {what}")));
      }
      Ok(v)
    };

    let mut list = Vec::with_capacity(value.list.len());
    for c in &value.list {
      let name = short_text(&c.name, "name")?;
      let label = short_text(&c.label, "label")?;
      let answer = c
        .answer
        .ok_or_else(|| FieldError::body("choices", "choice answer must be a boolean"))?;
      list.push(Choice { name, label, answer });
    }

    if format == ChoiceFormat::Radio && list.iter().filter(|c| c.answer).count() != 1 {
      return Err(FieldError::body("choices", "radio choices need exactly one answer"));
    }
    Ok(Choices { format, list })
  }
}

/// Whole question body, composed from the field validators above.
pub struct QuestionValidator;

impl Validate for QuestionValidator {
  type Input = QuestionIn;
  type Output = QuestionDraft;

  fn validate(&self, q: &QuestionIn) -> Result<QuestionDraft, FieldError> {
    let title = TitleValidator.validate(q.title.as_deref().unwrap_or(""))?;
    let statement = TextValidator { field: "statement", max: STATEMENT_MAX_LENGTH, required: true }
      .validate(q.statement.as_deref().unwrap_or(""))?;
    let explanation = TextValidator { field: "explanation", max: EXPLANATION_MAX_LENGTH, required: true }
      .validate(q.explanation.as_deref().unwrap_or(""))?;
    let language = Language::parse(q.language.as_deref().unwrap_or(""))
      .ok_or_else(|| FieldError::body("language", "unsupported language"))?;
    let language_snippet = TextValidator { field: "languageSnippet", max: SNIPPET_MAX_LENGTH, required: false }
      .validate(q.language_snippet.as_deref().unwrap_or(""))?;
    let choices = match &q.choices {
      Some(c) => ChoicesValidator.validate(c)?,
      None => return Err(FieldError::body("choices", "invalid choices")),
    };
    Ok(QuestionDraft { title, statement, explanation, language, language_snippet, choices })
  }
}

/// Accumulates one error per offending field.
#[derive(Default)]
pub struct Collector {
  errors: Vec<FieldError>,
}

impl Collector {
  /// Run `result` through the collector, keeping the value on success.
  pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
    match result {
      Ok(v) => Some(v),
      Err(e) => {
        if !self.errors.iter().any(|seen| seen.field == e.field) {
          self.errors.push(e);
        }
        None
      }
    }
  }

  pub fn finish(self) -> Result<(), crate::error::CatalogError> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(crate::error::CatalogError::Validation(self.errors))
    }
  }
}
