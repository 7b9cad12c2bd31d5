// Runtime executor for chart scripts

use crate::chart::{ChartSpec, Rendered};
use crate::directive::{Arg, AxisDirective, Directive, Invocation};
use crate::error::ChartError;
use crate::parser::ast::{Script, Statement};
use crate::resolve::Environment;
use crate::EncoderConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

/// A `chart` block after validation
#[derive(Debug, Clone)]
pub struct ChartBlock {
    /// `as NAME`: store the chart instead of rendering it
    pub name: Option<String>,
    /// `extends NAME`: start from a stored chart
    pub extends: Option<Arg>,
    pub directives: Vec<Directive>,
    pub line: usize,
}

/// Validate a whole script before anything runs.
pub fn compile(script: &Script) -> Result<Vec<ChartBlock>> {
    script
        .statements
        .iter()
        .map(|statement| {
            compile_chart(statement).with_context(|| format!("Invalid chart at line {}", statement.line))
        })
        .collect()
}

fn compile_chart(statement: &Statement) -> Result<ChartBlock> {
    if statement.name != "chart" {
        return Err(ChartError::MisplacedDirective {
            directive: statement.name.clone(),
            location: "outside a chart block",
        }
        .into());
    }

    let mut name = None;
    let mut extends = None;
    let mut args = statement.args.iter();
    while let Some(arg) = args.next() {
        match arg {
            Arg::Variable(word) if word == "as" => {
                name = match args.next() {
                    Some(Arg::Variable(target)) => Some(target.clone()),
                    _ => return Err(missing_operand("as").into()),
                };
            }
            Arg::Variable(word) if word == "extends" => {
                extends = Some(args.next().cloned().ok_or_else(|| missing_operand("extends"))?);
            }
            Arg::Variable(word) if word == "saveas" => {
                return Err(ChartError::NotImplemented("saveas".to_string()).into());
            }
            other => {
                return Err(ChartError::UnknownArgument {
                    directive: "chart".to_string(),
                    argument: describe(other),
                }
                .into());
            }
        }
    }

    let directives = statement
        .block
        .iter()
        .flatten()
        .map(|inner| {
            compile_directive(inner).with_context(|| format!("Invalid '{}' at line {}", inner.name, inner.line))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChartBlock {
        name,
        extends,
        directives,
        line: statement.line,
    })
}

fn compile_directive(statement: &Statement) -> Result<Directive> {
    match statement.name.as_str() {
        "axis" => Ok(Directive::Axis(compile_axis(statement)?)),
        "chart" => Err(ChartError::MisplacedDirective {
            directive: "chart".to_string(),
            location: "inside a chart block",
        }
        .into()),
        name => {
            if statement.block.is_some() {
                anyhow::bail!("'{}' does not take a block", name);
            }
            Ok(Directive::new(name, statement.args.clone())?)
        }
    }
}

/// `axis SIDE { ... }` or `axis SIDE hide`
fn compile_axis(statement: &Statement) -> Result<AxisDirective> {
    match (statement.args.as_slice(), &statement.block) {
        ([side], block) => {
            let options = block
                .iter()
                .flatten()
                .map(|inner| {
                    if inner.block.is_some() {
                        anyhow::bail!("'{}' does not take a block", inner.name);
                    }
                    Invocation::new(&inner.name, inner.args.clone())
                        .with_context(|| format!("Invalid '{}' at line {}", inner.name, inner.line))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(AxisDirective::new(side.clone(), options)?)
        }
        ([side, _], None) if statement.word(1).is_some_and(|w| w.eq_ignore_ascii_case("hide")) => {
            Ok(AxisDirective::hidden(side.clone()))
        }
        ([_, _], _) => Err(ChartError::InvalidAxis("expected 'hide' as last argument".to_string()).into()),
        _ => Err(ChartError::InvalidAxis("axis takes one or two arguments".to_string()).into()),
    }
}

fn missing_operand(keyword: &str) -> ChartError {
    ChartError::TooFewArguments {
        directive: format!("chart {}", keyword),
        min: 1,
        got: 0,
    }
}

fn describe(arg: &Arg) -> String {
    match arg {
        Arg::Variable(word) => word.clone(),
        Arg::Literal(value) => value.to_string(),
        Arg::List(_) => "[...]".to_string(),
    }
}

/// Run one chart block. Returns `None` for charts stored with `as`.
///
/// Rendering exports every internal option (without its underscore) and
/// every isolated variant (as `chart_<label>_only`) back into `env`.
pub fn run_chart(block: &ChartBlock, env: &mut Environment, config: &EncoderConfig) -> Result<Option<Rendered>> {
    let mut chart = match &block.extends {
        Some(parent) => parent_chart(parent, env).unwrap_or_default(),
        None => ChartSpec::new(),
    };

    for directive in &block.directives {
        chart
            .apply(directive, env)
            .with_context(|| format!("Failed to apply '{}'", directive.name()))?;
    }

    if let Some(name) = &block.name {
        debug!(chart = %name, "storing chart");
        env.store_chart(name, chart);
        return Ok(None);
    }

    let rendered = chart
        .finalize(config)
        .with_context(|| format!("Failed to render chart at line {}", block.line))?;

    for (name, value) in &rendered.internals {
        env.insert(name, value.clone());
    }
    for (label, image) in &rendered.isolated {
        let value = serde_json::to_value(image).context("Failed to export isolated chart")?;
        env.insert(&format!("chart_{}_only", label), value);
    }

    info!(url = %rendered.image.url, "rendered chart");
    Ok(Some(rendered))
}

/// Stored chart named by `parent`; a missing parent starts a fresh chart.
fn parent_chart(parent: &Arg, env: &Environment) -> Option<ChartSpec> {
    let name = match parent {
        Arg::Variable(name) => name.clone(),
        other => match env.resolve(other) {
            Value::String(name) => name,
            _ => return None,
        },
    };
    let found = env.chart(&name).cloned();
    if found.is_none() {
        debug!(chart = %name, "parent chart not found, starting fresh");
    }
    found
}

/// Compile and run a script, returning every rendered chart in order.
pub fn run_script(script: &Script, env: &mut Environment, config: &EncoderConfig) -> Result<Vec<Rendered>> {
    let blocks = compile(script)?;
    let mut rendered = Vec::new();
    for block in &blocks {
        if let Some(result) = run_chart(block, env, config)? {
            rendered.push(result);
        }
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn run(source: &str, env: &mut Environment) -> Result<Vec<Rendered>> {
        let script = parse(source)?;
        run_script(&script, env, &EncoderConfig::default())
    }

    fn chart_error(err: &anyhow::Error) -> Option<&ChartError> {
        err.chain().find_map(|cause| cause.downcast_ref::<ChartError>())
    }

    #[test]
    fn test_render_with_variables() {
        let mut env = Environment::new();
        env.insert("sales", json!([10, 20, 30]));
        let rendered = run(
            r#"chart {
                 chart-type "bar"
                 chart-data sales
               }"#,
            &mut env,
        )
        .unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(
            rendered[0].image.url,
            "http://chart.apis.google.com/chart?cht=bhg&chs=200x200&chd=e:AAgA.."
        );
    }

    #[test]
    fn test_bare_words_are_variables() {
        let mut env = Environment::new();
        let rendered = run("chart { chart-type line; chart-data [1, 2] }", &mut env).unwrap();
        // `line` is unresolved, so no type is set and the default applies
        assert!(rendered[0].image.url.contains("cht=lc"));
    }

    #[test]
    fn test_extends_stored_chart() {
        let mut env = Environment::new();
        let rendered = run(
            r#"
chart as base {
  chart-colors "ff0000"
  chart-data [1, 2]
}
chart extends base { chart-colors "00ff00" }
chart extends base { chart-title "Plain" }
"#,
            &mut env,
        )
        .unwrap();
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].image.url.contains("chco=ff0000,00ff00"));
        assert!(rendered[1].image.url.contains("chco=ff0000&"));
        assert!(rendered[1].image.url.contains("chtt=Plain"));
        assert!(env.chart("base").is_some());
    }

    #[test]
    fn test_extends_missing_parent_starts_fresh() {
        let mut env = Environment::new();
        let rendered = run("chart extends nowhere { chart-data [0, 1] }", &mut env).unwrap();
        assert!(rendered[0].image.url.ends_with("chd=e:AA.."));
    }

    #[test]
    fn test_axes_from_script() {
        let mut env = Environment::new();
        let rendered = run(
            r#"chart {
  chart-data [0, 10]
  axis "left" { axis-range 0 10 }
  axis "bottom" { axis-labels ["a", "b"] }
  axis "top" hide
}"#,
            &mut env,
        )
        .unwrap();
        let url = &rendered[0].image.url;
        assert!(url.contains("&chxt=y,x,t"), "{}", url);
        assert!(url.contains("chxr=0,0,10"), "{}", url);
        assert!(url.contains("chxl=1:|a|b|2:||"), "{}", url);
        assert!(url.contains("chxs=2,000000,11,0,_"), "{}", url);
    }

    #[test]
    fn test_exports_internals_and_isolated_variants() {
        let mut env = Environment::new();
        run(
            r#"chart {
  chart-auto-colors "336699" ["north", "south"]
  chart-data [1, 2] [3, 4]
}"#,
            &mut env,
        )
        .unwrap();
        assert_eq!(env.lookup("final_color_map.336699"), Some(&json!("north")));
        let south = env.lookup("chart_south_only.url").and_then(Value::as_str).unwrap();
        assert!(south.contains("chco=eeeeee,336699"), "{}", south);
        assert_eq!(env.lookup("chart_north_only.width"), Some(&json!(200)));
    }

    #[test]
    fn test_header_errors() {
        let mut env = Environment::new();
        let err = run("chart saveas x { }", &mut env).unwrap_err();
        assert_eq!(chart_error(&err), Some(&ChartError::NotImplemented("saveas".to_string())));
        assert!(format!("{:#}", err).contains("isn't implemented yet"));

        let err = run("chart bogus { }", &mut env).unwrap_err();
        assert!(matches!(chart_error(&err), Some(ChartError::UnknownArgument { .. })));

        let err = run("chart as { }", &mut env).unwrap_err();
        assert!(matches!(chart_error(&err), Some(ChartError::TooFewArguments { .. })));
    }

    #[test]
    fn test_directive_errors() {
        let mut env = Environment::new();
        let err = run("chart { chart-bogus 1 }", &mut env).unwrap_err();
        assert!(matches!(chart_error(&err), Some(ChartError::UnknownDirective(_))));

        let err = run("chart { axis-range 0 1 }", &mut env).unwrap_err();
        assert!(matches!(chart_error(&err), Some(ChartError::MisplacedDirective { .. })));

        let err = run("chart-title \"x\"", &mut env).unwrap_err();
        assert!(matches!(chart_error(&err), Some(ChartError::MisplacedDirective { .. })));

        let err = run("chart { axis \"left\" show }", &mut env).unwrap_err();
        assert!(matches!(chart_error(&err), Some(ChartError::InvalidAxis(_))));

        let err = run("chart { axis }", &mut env).unwrap_err();
        assert!(matches!(chart_error(&err), Some(ChartError::InvalidAxis(_))));
    }

    #[test]
    fn test_errors_happen_before_rendering() {
        let mut env = Environment::new();
        let result = run(
            "chart { chart-auto-colors \"336699\" [\"a\"]; chart-data [1, 2] }\nchart { chart-bogus }",
            &mut env,
        );
        assert!(result.is_err());
        assert!(env.lookup("final_color_map").is_none());
    }

    #[test]
    fn test_empty_chart_fails_to_render() {
        let mut env = Environment::new();
        let err = run("chart { chart-title \"none\" }", &mut env).unwrap_err();
        assert_eq!(chart_error(&err), Some(&ChartError::EmptyData));
        assert!(format!("{:#}", err).contains("line 1"));
    }
}
