//! Compiled templates

use crate::compiler::compile;
use crate::error::{Error, Result};
use crate::script::Function;
use crate::settings::TemplateSettings;
use serde::Serialize;

/// A compiled template.
///
/// Holds no state between renders, so a `Template` can be shared across
/// threads and rendered concurrently.
#[derive(Debug, Clone)]
pub struct Template {
    function: Function,
    source: String,
}

impl Template {
    pub(crate) fn new(function: Function, source: String) -> Self {
        Self { function, source }
    }

    /// Reloads a template from the text returned by [`Template::source`].
    ///
    /// # Errors
    /// * `Error::GenerationError` if `source` is not a function definition
    pub fn from_source(source: &str) -> Result<Self> {
        let function = Function::parse(source).map_err(|error| Error::GenerationError {
            error,
            generated: source.to_string(),
        })?;
        Ok(Self::new(function, source.to_string()))
    }

    /// Renders the template with `data`.
    ///
    /// # Errors
    /// * `Error::RenderError` if an embedded statement fails
    pub fn render(&self, data: &serde_json::Value) -> Result<String> {
        Ok(self.function.call(data)?)
    }

    /// Renders the template with any serializable value as data.
    pub fn render_serialize<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let data = serde_json::to_value(data)?;
        self.render(&data)
    }

    /// The generated function definition, `function(<param>){ ... }`.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compiles `text` and renders it once.
pub fn render(
    text: &str,
    data: &serde_json::Value,
    settings: Option<&TemplateSettings>,
) -> Result<String> {
    compile(text, settings)?.render(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Person {
        name: &'static str,
        age: u32,
    }

    #[test]
    fn renders_serializable_data() {
        let template = compile("<%= name %> is <%= age %>", None).unwrap();
        let rendered = template.render_serialize(&Person { name: "Moe", age: 42 }).unwrap();
        assert_eq!(rendered, "Moe is 42");
    }

    #[test]
    fn from_source_round_trips() {
        let template = compile("<%- name %>!", None).unwrap();
        let reloaded = Template::from_source(template.source()).unwrap();
        let data = json!({"name": "<Curly>"});
        assert_eq!(reloaded.render(&data).unwrap(), template.render(&data).unwrap());
        assert_eq!(reloaded.source(), template.source());
    }

    #[test]
    fn from_source_rejects_non_functions() {
        let err = Template::from_source("not a function").unwrap_err();
        assert_eq!(err.generated_source(), Some("not a function"));
    }

    #[test]
    fn one_shot_render() {
        assert_eq!(render("<%= 1 + 1 %>", &json!({}), None).unwrap(), "2");
    }

    #[test]
    fn templates_render_across_threads() {
        let template = compile("<%= n * 2 %>", None).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let template = template.clone();
                std::thread::spawn(move || template.render(&json!({ "n": n })).unwrap())
            })
            .collect();
        let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec!["0", "2", "4", "6"]);
    }
}
