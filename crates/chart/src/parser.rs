//! Surface parser for the chart DSL, built on winnow combinators.
//!
//! All three dialects share this surface: statements are call chains with
//! named arguments, and `filter(collection, predicate)` heads carry a small
//! comparison language. Dialect-specific meaning lives in the hosts; this
//! module only produces the syntax tree.

use winnow::ascii::float;
use winnow::combinator::{alt, opt, peek, separated};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::ast::{
    Arg, Call, ChainHead, CmpOp, Collection, Literal, PredVar, Predicate, Statement, Value,
};
use crate::error::ChartError;

type PResult<T> = winnow::ModalResult<T>;

/// Parse a complete program into statements.
///
/// A leading `// ERROR: <reason>` comment is the model's out-of-scope marker
/// and becomes a fatal error. Input with no recognizable statement at all is
/// rejected as not-DSL.
pub fn parse_program(source: &str) -> Result<Vec<Statement>, ChartError> {
    for line in source.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("//") {
            if let Some(reason) = rest.trim_start().strip_prefix("ERROR:") {
                return Err(ChartError::OutOfScope(reason.trim().to_string()));
            }
        }
    }

    let mut input = source;
    let mut statements = Vec::new();

    loop {
        skip_trivia(&mut input);
        if input.is_empty() {
            break;
        }
        match parse_statement(&mut input) {
            Ok(stmt) => statements.push(stmt),
            Err(_) => {
                let near: String = input.chars().take(48).collect();
                return Err(if statements.is_empty() {
                    ChartError::NotDsl(near)
                } else {
                    ChartError::Syntax {
                        message: "expected a statement".to_string(),
                        near,
                    }
                });
            }
        }
    }

    if statements.is_empty() {
        return Err(ChartError::NotDsl(
            source.trim().chars().take(48).collect(),
        ));
    }

    Ok(statements)
}

/// Whitespace, comments, and statement separators between statements.
fn skip_trivia(input: &mut &str) {
    loop {
        let before = *input;
        *input = input.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if let Some(rest) = input.strip_prefix("//") {
            *input = match rest.find('\n') {
                Some(pos) => &rest[pos + 1..],
                None => "",
            };
        }
        if *input == before {
            break;
        }
    }
}

/// Whitespace inside a statement (no comments, no separators).
fn ws(input: &mut &str) -> PResult<()> {
    let _ = take_while(0.., |c: char| c.is_whitespace()).parse_next(input)?;
    Ok(())
}

fn parse_ident(input: &mut &str) -> PResult<String> {
    let ident = (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;
    Ok(ident.to_string())
}

/// Quoted string, double or single quotes, no escape sequences.
fn parse_string(input: &mut &str) -> PResult<String> {
    alt((
        |input: &mut &str| {
            '"'.parse_next(input)?;
            let s: &str = take_while(0.., |c: char| c != '"').parse_next(input)?;
            '"'.parse_next(input)?;
            Ok(s.to_string())
        },
        |input: &mut &str| {
            '\''.parse_next(input)?;
            let s: &str = take_while(0.., |c: char| c != '\'').parse_next(input)?;
            '\''.parse_next(input)?;
            Ok(s.to_string())
        },
    ))
    .parse_next(input)
}

fn parse_number(input: &mut &str) -> PResult<f64> {
    float.parse_next(input)
}

fn parse_list(input: &mut &str) -> PResult<Vec<Value>> {
    '['.parse_next(input)?;
    ws(input)?;
    let items: Vec<Value> =
        separated(0.., parse_value, (ws, ',', ws)).parse_next(input)?;
    let _ = opt((ws, ',')).parse_next(input)?;
    ws(input)?;
    ']'.parse_next(input)?;
    Ok(items)
}

/// `{time=0, value=0.5, shape="linear"}`; also tolerates `:` separators.
fn parse_object(input: &mut &str) -> PResult<Vec<(String, Value)>> {
    '{'.parse_next(input)?;
    ws(input)?;
    let fields: Vec<(String, Value)> = separated(
        0..,
        |input: &mut &str| {
            let name = alt((parse_ident, parse_string)).parse_next(input)?;
            ws(input)?;
            let _ = one_of(['=', ':']).parse_next(input)?;
            ws(input)?;
            let value = parse_value(input)?;
            Ok((name, value))
        },
        (ws, ',', ws),
    )
    .parse_next(input)?;
    let _ = opt((ws, ',')).parse_next(input)?;
    ws(input)?;
    '}'.parse_next(input)?;
    Ok(fields)
}

fn parse_value(input: &mut &str) -> PResult<Value> {
    alt((
        parse_string.map(Value::Str),
        parse_list.map(Value::List),
        parse_object.map(Value::Object),
        parse_number.map(Value::Num),
        parse_ident.map(|s| match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Ident(s),
        }),
    ))
    .parse_next(input)
}

fn parse_arg(input: &mut &str) -> PResult<Arg> {
    alt((
        (parse_ident, (ws, '=', ws), parse_value).map(|(name, _, value)| Arg {
            name: Some(name),
            value,
        }),
        parse_value.map(|value| Arg { name: None, value }),
    ))
    .parse_next(input)
}

/// `name(arg, arg, ...)` with the raw source text preserved for hosts that
/// need to re-extract list arguments.
pub fn parse_call(input: &mut &str) -> PResult<Call> {
    let ((name, args), raw) = (parse_ident, |input: &mut &str| {
        ws(input)?;
        '('.parse_next(input)?;
        ws(input)?;
        let args: Vec<Arg> = separated(0.., parse_arg, (ws, ',', ws)).parse_next(input)?;
        let _ = opt((ws, ',')).parse_next(input)?;
        ws(input)?;
        ')'.parse_next(input)?;
        Ok(args)
    })
        .with_taken()
        .parse_next(input)?;

    Ok(Call {
        name,
        args,
        raw: raw.trim().to_string(),
    })
}

fn parse_cmp_op(input: &mut &str) -> PResult<CmpOp> {
    alt((
        "==".map(|_| CmpOp::Eq),
        "!=".map(|_| CmpOp::Ne),
        "<=".map(|_| CmpOp::Le),
        ">=".map(|_| CmpOp::Ge),
        "<".map(|_| CmpOp::Lt),
        ">".map(|_| CmpOp::Gt),
    ))
    .parse_next(input)
}

fn parse_literal(input: &mut &str) -> PResult<Literal> {
    alt((
        parse_string.map(Literal::Str),
        parse_number.map(Literal::Num),
        "true".map(|_| Literal::Bool(true)),
        "false".map(|_| Literal::Bool(false)),
    ))
    .parse_next(input)
}

/// `track.muted == true`, `clip.length < 2.79`, `track.name in ["A", "B"]`.
/// The iteration variable is case-sensitive.
pub fn parse_predicate(input: &mut &str) -> PResult<Predicate> {
    let var = alt((
        "track".map(|_| PredVar::Track),
        "clip".map(|_| PredVar::Clip),
    ))
    .parse_next(input)?;
    '.'.parse_next(input)?;
    let field = parse_ident(input)?;
    ws(input)?;

    if opt("in").parse_next(input)?.is_some() {
        ws(input)?;
        '['.parse_next(input)?;
        ws(input)?;
        let values: Vec<Literal> =
            separated(1.., parse_literal, (ws, ',', ws)).parse_next(input)?;
        ws(input)?;
        ']'.parse_next(input)?;
        Ok(Predicate::In { var, field, values })
    } else {
        let op = parse_cmp_op(input)?;
        ws(input)?;
        let value = parse_literal(input)?;
        Ok(Predicate::Compare {
            var,
            field,
            op,
            value,
        })
    }
}

fn parse_filter_head(input: &mut &str) -> PResult<ChainHead> {
    "filter".parse_next(input)?;
    ws(input)?;
    '('.parse_next(input)?;
    ws(input)?;
    let collection = alt((
        "tracks".map(|_| Collection::Tracks),
        "clips".map(|_| Collection::Clips),
    ))
    .parse_next(input)?;
    ws(input)?;
    ','.parse_next(input)?;
    ws(input)?;
    let predicate = parse_predicate(input)?;
    ws(input)?;
    ')'.parse_next(input)?;
    Ok(ChainHead::Filter {
        collection,
        predicate,
    })
}

fn parse_head(input: &mut &str) -> PResult<ChainHead> {
    let name = peek(parse_ident).parse_next(input)?;
    if name == "filter" {
        parse_filter_head(input)
    } else {
        parse_call.map(ChainHead::Call).parse_next(input)
    }
}

fn parse_statement(input: &mut &str) -> PResult<Statement> {
    let head = parse_head(input)?;
    let mut methods = Vec::new();
    loop {
        let mut probe = *input;
        let _ = ws(&mut probe);
        if let Some(rest) = probe.strip_prefix('.') {
            *input = rest;
            ws(input)?;
            methods.push(parse_call(input)?);
        } else {
            break;
        }
    }
    Ok(Statement { head, methods })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_chain() {
        let stmts = parse_program(r#"track(id=1).set_track(volume_db=-6.0);"#).unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].head_name(), "track");
        assert_eq!(stmts[0].methods.len(), 1);
        assert_eq!(stmts[0].methods[0].name, "set_track");
        assert_eq!(
            stmts[0].methods[0].args[0],
            Arg {
                name: Some("volume_db".to_string()),
                value: Value::Num(-6.0),
            }
        );
    }

    #[test]
    fn test_parse_bare_track_create() {
        let stmts = parse_program(r#"track(name="Bass")"#).unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].methods.is_empty());
    }

    #[test]
    fn test_parse_multiple_statements() {
        let src = r#"
            track(id=1).add_fx(fxname="Reverb");
            track(id=2).set_track(mute=true)
        "#;
        let stmts = parse_program(src).unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_parse_filter_predicate() {
        let stmts =
            parse_program(r#"filter(clips, clip.length < 2.79).set_clip(selected=true);"#)
                .unwrap();
        match &stmts[0].head {
            ChainHead::Filter {
                collection,
                predicate,
            } => {
                assert_eq!(*collection, Collection::Clips);
                assert_eq!(
                    *predicate,
                    Predicate::Compare {
                        var: PredVar::Clip,
                        field: "length".to_string(),
                        op: CmpOp::Lt,
                        value: Literal::Num(2.79),
                    }
                );
            }
            other => panic!("expected filter head, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_in_predicate() {
        let stmts =
            parse_program(r#"filter(tracks, track.name in ["Kick", "Snare"]).delete();"#).unwrap();
        match &stmts[0].head {
            ChainHead::Filter { predicate, .. } => match predicate {
                Predicate::In { values, .. } => assert_eq!(values.len(), 2),
                other => panic!("expected in-predicate, got {:?}", other),
            },
            other => panic!("expected filter head, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_argument() {
        let stmts =
            parse_program(r#"progression(chords=["Em", "C", "G", "D"], length=16);"#).unwrap();
        let call = match &stmts[0].head {
            ChainHead::Call(call) => call,
            other => panic!("expected call head, got {:?}", other),
        };
        match &call.args[0].value {
            Value::List(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(items[0], Value::Str("Em".to_string()));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_object_list() {
        let src = r#"track(id=1).addAutomation(param="volume", points=[{time=0, value=0.0}, {time=4, value=1.0, shape="linear"}]);"#;
        let stmts = parse_program(src).unwrap();
        let call = &stmts[0].methods[0];
        let points = call
            .args
            .iter()
            .find(|a| a.name.as_deref() == Some("points"))
            .unwrap();
        match &points.value {
            Value::List(items) => {
                assert_eq!(items.len(), 2);
                match &items[1] {
                    Value::Object(fields) => {
                        assert_eq!(fields[2].0, "shape");
                    }
                    other => panic!("expected object, got {:?}", other),
                }
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_error_comment_is_out_of_scope() {
        let err = parse_program("// ERROR: not a music production request").unwrap_err();
        match err {
            ChartError::OutOfScope(reason) => {
                assert_eq!(reason, "not a music production request")
            }
            other => panic!("expected out-of-scope, got {:?}", other),
        }
    }

    #[test]
    fn test_prose_is_not_dsl() {
        let err = parse_program("I would love to help you bake a cake!").unwrap_err();
        assert!(matches!(err, ChartError::NotDsl(_)));
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "// create the bass track\ntrack(name=\"Bass\");\n// done\n";
        let stmts = parse_program(src).unwrap();
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_unquoted_ident_value() {
        let stmts = parse_program(r#"arpeggio(symbol="Em", direction=up);"#).unwrap();
        let call = match &stmts[0].head {
            ChainHead::Call(call) => call,
            other => panic!("expected call head, got {:?}", other),
        };
        assert_eq!(call.args[1].value, Value::Ident("up".to_string()));
    }

    #[test]
    fn test_raw_text_preserved() {
        let stmts = parse_program(r#"progression(chords=["Em", "C"]);"#).unwrap();
        let call = match &stmts[0].head {
            ChainHead::Call(call) => call,
            other => panic!("expected call head, got {:?}", other),
        };
        assert!(call.raw.contains(r#"["Em", "C"]"#));
    }
}
