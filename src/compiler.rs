//! Compile pipeline: scan, generate, validate the variable, build.

use crate::codegen::CodeGenerator;
use crate::constants::generated::{EPILOGUE, PRELUDE, UTILITY};
use crate::constants::DEFAULT_VARIABLE;
use crate::error::{Error, Result};
use crate::identifier::validate_variable;
use crate::scanner::Scanner;
use crate::script::Function;
use crate::settings::TemplateSettings;
use crate::template::Template;
use log::{debug, trace};

/// Compiles template text into a reusable [`Template`].
///
/// Without `settings` the default ERB-style delimiters are used and the
/// data object's properties are reachable by name inside the template.
///
/// # Errors
/// * `Error::InvalidVariable` if `settings.variable` is not a bare identifier
/// * `Error::GenerationError` if the generated source does not parse; the
///   error carries that source
///
/// # Examples
/// ```
/// use microtemplate::compile;
/// use serde_json::json;
///
/// let template = compile("hello: <%= name %>", None).unwrap();
/// assert_eq!(template.render(&json!({"name": "moe"})).unwrap(), "hello: moe");
/// ```
pub fn compile(text: &str, settings: Option<&TemplateSettings>) -> Result<Template> {
    let defaults;
    let settings = match settings {
        Some(settings) => settings,
        None => {
            defaults = TemplateSettings::default();
            &defaults
        }
    };

    let mut generator = CodeGenerator::new();
    for token in Scanner::new(text, settings) {
        generator.push(token);
    }
    let counts = generator.counts();
    debug!(
        "Scanned template: {} interpolate, {} escape, {} evaluate directive(s)",
        counts.interpolate, counts.escape, counts.evaluate
    );
    let body = format!("{PRELUDE}{}{EPILOGUE}", generator.finish());

    let (param, source) = match &settings.variable {
        Some(variable) => {
            let param = validate_variable(variable)?;
            debug!("Data is exposed as '{param}'");
            (param.to_string(), body)
        }
        None => {
            let source = bind_data_properties(DEFAULT_VARIABLE, body)?;
            (DEFAULT_VARIABLE.to_string(), source)
        }
    };

    let function = build(&param, &source)?;
    let definition = definition(&param, &source);
    trace!("Generated template source:\n{definition}");
    Ok(Template::new(function, definition))
}

fn definition(param: &str, source: &str) -> String {
    format!("function({param}){{\n{source}}}")
}

fn build(param: &str, source: &str) -> Result<Function> {
    Function::new(&[param, UTILITY], source).map_err(|error| Error::GenerationError {
        error,
        generated: definition(param, source),
    })
}

/// Prefixes `body` with a `var` binding for every name it uses without
/// declaring, each read from the data parameter.
fn bind_data_properties(param: &str, body: String) -> Result<String> {
    let names = build(param, &body)?.free_names();
    debug!("Binding data properties by name: {names:?}");

    let mut source = format!("{param} = {param} || {{}};\n");
    if !names.is_empty() {
        let bindings: Vec<String> = names.iter().map(|name| format!("{name} = {param}.{name}")).collect();
        source.push_str(&format!("var {};\n", bindings.join(", ")));
    }
    source.push_str(&body);
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_variable_source_shape() {
        let settings = TemplateSettings::default().with_variable(" data ");
        let template = compile("<%= data.x %>", Some(&settings)).unwrap();
        assert_eq!(
            template.source(),
            "function(data){\n\
             var __t,__p='',print=function(...__a){__p+=__a.join('');};\n\
             __p+=''+\n((__t=( data.x ))==null?'':__t)+\n'';\n\
             return __p;\n}"
        );
    }

    #[test]
    fn default_mode_binds_free_names_in_order() {
        let template = compile("<%= b %><% for (var i = 0; i < a.length; i++) { %>x<% } %>", None).unwrap();
        assert!(template.source().starts_with("function(obj){\nobj = obj || {};\nvar b = obj.b, a = obj.a;\n"));
    }

    #[test]
    fn default_mode_without_names_only_guards_data() {
        let template = compile("static", None).unwrap();
        assert!(template.source().starts_with("function(obj){\nobj = obj || {};\nvar __t,"));
        assert_eq!(template.render(&json!(null)).unwrap(), "static");
    }

    #[test]
    fn invalid_variable_fails_before_building() {
        let settings = TemplateSettings::default().with_variable("obj){}; evil(");
        let err = compile("<%= 1 %>", Some(&settings)).unwrap_err();
        assert!(matches!(err, Error::InvalidVariable { ref variable } if variable == "obj){}; evil("));
    }

    #[test]
    fn unparsable_statements_carry_source() {
        let err = compile("<% if (x) { %>open", None).unwrap_err();
        let generated = err.generated_source().unwrap();
        assert!(generated.starts_with("function(obj){"));
        assert!(generated.contains(" if (x) { "));
    }
}
