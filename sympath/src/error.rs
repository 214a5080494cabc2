use std::fmt::{Debug, Display};

#[derive(Clone, PartialEq)]
pub struct ErrorStack {
  /// Innermost error first; each `wrap` pushes outer context onto the end.
  pub errors: Vec<String>,
}

impl ErrorStack {
  #[cold]
  pub fn new(msg: impl Into<String>) -> Self {
    ErrorStack {
      errors: vec![msg.into()],
    }
  }

  #[cold]
  pub fn wrap(mut self, msg: impl Into<String>) -> Self {
    self.errors.push(msg.into());
    self
  }

  /// The original (innermost) message.
  pub fn root(&self) -> &str {
    self.errors.first().map(String::as_str).unwrap_or("")
  }
}

/// Outermost context first, each inner message indented one step further.
impl Display for ErrorStack {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut first = true;
    for (depth, msg) in self.errors.iter().rev().enumerate() {
      for line in msg.lines() {
        if !first {
          f.write_str("\n")?;
        }
        first = false;
        write!(f, "{:indent$}{line}", "", indent = depth * 2)?;
      }
    }
    Ok(())
  }
}

impl Debug for ErrorStack {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

impl std::error::Error for ErrorStack {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wrapped_errors_render_outermost_first() {
    let err = ErrorStack::new("point 3 is not finite").wrap("Error building path");
    assert_eq!(err.root(), "point 3 is not finite");
    assert_eq!(
      format!("{err}"),
      "Error building path\n  point 3 is not finite"
    );
  }

  #[test]
  fn multi_line_messages_keep_their_depth() {
    let err = ErrorStack::new("bad point\nat index 4")
      .wrap("Invalid path")
      .wrap("Error transforming path");
    assert_eq!(
      format!("{err:?}"),
      "Error transforming path\n  Invalid path\n    bad point\n    at index 4"
    );
  }
}
