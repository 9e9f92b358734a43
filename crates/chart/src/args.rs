//! Typed access to a call's argument bag.
//!
//! Handlers validate their arguments through this view: presence is an
//! `Option`, a present-but-wrong-typed value is a `BadArgument` error, and
//! parameters no handler asked for are reported through `warn_unknown`.

use crate::ast::{Arg, Call, Value};
use crate::error::{ChartError, Warnings};

pub struct Args<'a> {
    call: &'a Call,
}

impl<'a> Args<'a> {
    pub fn new(call: &'a Call) -> Self {
        Args { call }
    }

    pub fn method(&self) -> &str {
        &self.call.name
    }

    fn find(&self, name: &str) -> Option<&'a Value> {
        self.call
            .args
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| &a.value)
    }

    fn bad(&self, message: impl Into<String>) -> ChartError {
        ChartError::BadArgument {
            method: self.call.name.clone(),
            message: message.into(),
        }
    }

    /// The sole positional argument, for methods like `add_fx("Reverb")`.
    pub fn sole_positional(&self) -> Option<&'a Value> {
        let mut unnamed = self.call.args.iter().filter(|a| a.name.is_none());
        match (unnamed.next(), unnamed.next()) {
            (Some(Arg { value, .. }), None) => Some(value),
            _ => None,
        }
    }

    pub fn opt_text(&self, name: &str) -> Result<Option<String>, ChartError> {
        match self.find(name) {
            None => Ok(None),
            Some(value) => value
                .as_text()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.bad(format!("{} must be a string", name))),
        }
    }

    pub fn req_text(&self, name: &str) -> Result<String, ChartError> {
        self.opt_text(name)?
            .ok_or_else(|| self.bad(format!("missing required parameter {}", name)))
    }

    pub fn opt_num(&self, name: &str) -> Result<Option<f64>, ChartError> {
        match self.find(name) {
            None => Ok(None),
            Some(value) => value
                .as_num()
                .map(Some)
                .ok_or_else(|| self.bad(format!("{} must be a number", name))),
        }
    }

    pub fn req_num(&self, name: &str) -> Result<f64, ChartError> {
        self.opt_num(name)?
            .ok_or_else(|| self.bad(format!("missing required parameter {}", name)))
    }

    fn integral(&self, name: &str, n: f64) -> Result<i64, ChartError> {
        if n.fract() != 0.0 {
            return Err(self.bad(format!("{} must be an integer", name)));
        }
        Ok(n as i64)
    }

    pub fn opt_u32(&self, name: &str) -> Result<Option<u32>, ChartError> {
        match self.opt_num(name)? {
            None => Ok(None),
            Some(n) => {
                let i = self.integral(name, n)?;
                u32::try_from(i)
                    .map(Some)
                    .map_err(|_| self.bad(format!("{} out of range", name)))
            }
        }
    }

    pub fn opt_usize(&self, name: &str) -> Result<Option<usize>, ChartError> {
        match self.opt_num(name)? {
            None => Ok(None),
            Some(n) => {
                let i = self.integral(name, n)?;
                usize::try_from(i)
                    .map(Some)
                    .map_err(|_| self.bad(format!("{} out of range", name)))
            }
        }
    }

    pub fn opt_u8(&self, name: &str) -> Result<Option<u8>, ChartError> {
        match self.opt_num(name)? {
            None => Ok(None),
            Some(n) => {
                let i = self.integral(name, n)?;
                u8::try_from(i)
                    .map(Some)
                    .map_err(|_| self.bad(format!("{} out of range (0-127)", name)))
            }
        }
    }

    pub fn opt_i8(&self, name: &str) -> Result<Option<i8>, ChartError> {
        match self.opt_num(name)? {
            None => Ok(None),
            Some(n) => {
                let i = self.integral(name, n)?;
                i8::try_from(i)
                    .map(Some)
                    .map_err(|_| self.bad(format!("{} out of range", name)))
            }
        }
    }

    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>, ChartError> {
        match self.find(name) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.bad(format!("{} must be true or false", name))),
        }
    }

    /// A list argument. Tolerates both the bound path (a real `Value::List`)
    /// and the raw-text path where the binder handed the list through as a
    /// string; the latter is recovered with `extract_bracketed`.
    pub fn opt_list(&self, name: &str) -> Result<Option<Vec<Value>>, ChartError> {
        match self.find(name) {
            None => Ok(None),
            Some(Value::List(items)) => Ok(Some(items.clone())),
            Some(Value::Str(s)) | Some(Value::Ident(s)) => extract_bracketed(s)
                .map(|items| Some(items.into_iter().map(Value::Str).collect()))
                .ok_or_else(|| self.bad(format!("{} must be a list", name))),
            Some(_) => Err(self.bad(format!("{} must be a list", name))),
        }
    }

    /// Warn about any named parameter not in `allowed`. Unknown parameters
    /// are ignored, not fatal.
    pub fn warn_unknown(&self, allowed: &[&str], warnings: &mut Warnings) {
        for arg in &self.call.args {
            if let Some(name) = &arg.name {
                if !allowed.contains(&name.as_str()) {
                    warnings.warn(format!(
                        "{}: ignoring unknown parameter {:?}",
                        self.call.name, name
                    ));
                }
            }
        }
    }
}

/// Recover a list from raw DSL text: find the bracketed span, split on
/// commas, trim whitespace and quotes. The small bespoke path for when
/// argument binding hands a list through as text.
pub fn extract_bracketed(raw: &str) -> Option<Vec<String>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    let inner = &raw[start + 1..end];
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(
        inner
            .split(',')
            .map(|item| item.trim().trim_matches(['"', '\'']).to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use crate::ast::ChainHead;
    use pretty_assertions::assert_eq;

    fn head_call(src: &str) -> Call {
        let stmts = parse_program(src).unwrap();
        match &stmts[0].head {
            ChainHead::Call(call) => call.clone(),
            other => panic!("expected call head, got {:?}", other),
        }
    }

    #[test]
    fn test_typed_accessors() {
        let call = head_call(r#"note(pitch="E1", duration=4, velocity=100, legato=true);"#);
        let args = Args::new(&call);
        assert_eq!(args.req_text("pitch").unwrap(), "E1");
        assert_eq!(args.req_num("duration").unwrap(), 4.0);
        assert_eq!(args.opt_u8("velocity").unwrap(), Some(100));
        assert_eq!(args.opt_bool("legato").unwrap(), Some(true));
        assert_eq!(args.opt_num("missing").unwrap(), None);
    }

    #[test]
    fn test_wrong_type_is_error() {
        let call = head_call(r#"note(velocity="loud");"#);
        let args = Args::new(&call);
        assert!(args.opt_u8("velocity").is_err());
    }

    #[test]
    fn test_non_integral_is_error() {
        let call = head_call(r#"pattern(velocity=99.5);"#);
        let args = Args::new(&call);
        assert!(args.opt_u8("velocity").is_err());
    }

    #[test]
    fn test_list_bound_path() {
        let call = head_call(r#"progression(chords=["Em", "C"]);"#);
        let args = Args::new(&call);
        let list = args.opt_list("chords").unwrap().unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_list_raw_text_path() {
        let call = head_call(r#"progression(chords="[Em, C, G]");"#);
        let args = Args::new(&call);
        let list = args.opt_list("chords").unwrap().unwrap();
        assert_eq!(
            list,
            vec![
                Value::Str("Em".to_string()),
                Value::Str("C".to_string()),
                Value::Str("G".to_string())
            ]
        );
    }

    #[test]
    fn test_extract_bracketed() {
        assert_eq!(
            extract_bracketed(r#"chords=[ "Em" , 'C', G ]"#).unwrap(),
            vec!["Em", "C", "G"]
        );
        assert_eq!(extract_bracketed("[]").unwrap(), Vec::<String>::new());
        assert!(extract_bracketed("no list here").is_none());
    }

    #[test]
    fn test_unknown_parameter_warns() {
        let call = head_call(r#"pattern(drum="kick", grid="x---x---x---x---", swing=0.2);"#);
        let args = Args::new(&call);
        let mut warnings = Warnings::new();
        args.warn_unknown(&["drum", "grid", "velocity"], &mut warnings);
        assert_eq!(warnings.as_slice().len(), 1);
        assert!(warnings.as_slice()[0].message.contains("swing"));
    }
}
