use crate::context::Context;
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A custom error describing the error cases for rendering templates.
#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    /// The template references a name that is not in the context.
    #[error("unknown variable {0} in template")]
    UnknownVariable(String),
    /// There is an opening `{{` without a closing pair, the parameter is the byte offset.
    #[error("unclosed placeholder at position {0}")]
    Unclosed(usize),
}

/// Substitute every `{{ NAME }}` placeholder in the template with the value from the context.
///
/// Whitespace around the name is ignored, single braces are kept as they are.
pub fn render(template: &str, context: &Context) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        rendered.push_str(&rest[..start]);

        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or(TemplateError::Unclosed(offset + start))?;

        let name = after_open[..end].trim();
        let value = context
            .get(name)
            .ok_or_else(|| TemplateError::UnknownVariable(name.to_string()))?;
        rendered.push_str(value);

        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }
    rendered.push_str(rest);

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn context() -> Context {
        HashMap::from([
            ("STACK".to_string(), "demo".to_string()),
            ("HTTP_PATH_LAST".to_string(), "home-config".to_string()),
        ])
    }

    #[test]
    fn it_should_keep_plain_text() -> Result<(), TemplateError> {
        assert_eq!("/etc/config", render("/etc/config", &context())?);
        assert_eq!("", render("", &context())?);

        Ok(())
    }

    #[test]
    fn it_should_substitute_placeholders() -> Result<(), TemplateError> {
        assert_eq!(
            "/var/stacks/demo/home-config",
            render("/var/stacks/{{STACK}}/{{ HTTP_PATH_LAST }}", &context())?
        );

        Ok(())
    }

    #[test]
    fn it_should_keep_single_braces() -> Result<(), TemplateError> {
        assert_eq!("{ demo }", render("{ {{STACK}} }", &context())?);
        assert_eq!("a{b}c", render("a{b}c", &context())?);

        Ok(())
    }

    #[test]
    fn it_should_fail_on_unknown_variables() {
        let result = render("/data/{{ MISSING }}", &context());

        assert_eq!(
            Err(TemplateError::UnknownVariable(String::from("MISSING"))),
            result
        );
    }

    #[test]
    fn it_should_fail_on_unclosed_placeholders() {
        let result = render("/data/{{STACK}}/{{STACK", &context());

        assert_eq!(Err(TemplateError::Unclosed(16)), result);
    }
}
