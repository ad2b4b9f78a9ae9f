use serde_json::{json, Value};

use crate::ops::binding::{ArgumentBinding, Params, RawArg};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_single_json_object_binds_as_keywords() {
    let binding = ArgumentBinding::from_raw(&args(&[r#"{"expr_str": "x + 1"}"#]));
    match binding {
        ArgumentBinding::Keyword(map) => {
            assert_eq!(map.get("expr_str"), Some(&json!("x + 1")));
        }
        other => panic!("expected keyword binding, got {:?}", other),
    }
}

#[test]
fn test_single_json_array_binds_as_list() {
    let binding = ArgumentBinding::from_raw(&args(&["[1, 2]"]));
    match binding {
        ArgumentBinding::List(items) => assert_eq!(items, vec![json!(1), json!(2)]),
        other => panic!("expected list binding, got {:?}", other),
    }
}

#[test]
fn test_empty_object_and_array_still_bind_structurally() {
    assert!(matches!(
        ArgumentBinding::from_raw(&args(&["{}"])),
        ArgumentBinding::Keyword(_)
    ));
    assert!(matches!(
        ArgumentBinding::from_raw(&args(&["[]"])),
        ArgumentBinding::List(_)
    ));
}

#[test]
fn test_malformed_json_falls_back_to_positional() {
    assert!(matches!(
        ArgumentBinding::from_raw(&args(&["{not json"])),
        ArgumentBinding::Positional(_)
    ));
    assert!(matches!(
        ArgumentBinding::from_raw(&args(&["[1, 2"])),
        ArgumentBinding::Positional(_)
    ));
}

#[test]
fn test_multiple_arguments_are_always_positional() {
    let binding = ArgumentBinding::from_raw(&args(&["[1, 2]", "[3, 4]"]));
    match binding {
        ArgumentBinding::Positional(items) => assert_eq!(items.len(), 2),
        other => panic!("expected positional binding, got {:?}", other),
    }
}

#[test]
fn test_text_integer_parsing_is_strict() {
    assert_eq!(RawArg::Text("3").integer("order").unwrap(), 3);
    assert_eq!(RawArg::Text(" 4 ").integer("order").unwrap(), 4);
    let err = RawArg::Text("2.5").integer("order").unwrap_err();
    assert_eq!(err.to_string(), "argument 'order' must be an integer");
}

#[test]
fn test_json_number_truncates_like_int_conversion() {
    let v = json!(2.9);
    assert_eq!(RawArg::Json(&v).integer("order").unwrap(), 2);
    let v = json!(-2.9);
    assert_eq!(RawArg::Json(&v).integer("order").unwrap(), -2);
    let v = json!("7");
    assert_eq!(RawArg::Json(&v).integer("order").unwrap(), 7);
}

#[test]
fn test_string_accessor() {
    assert_eq!(RawArg::Text("x + 1").string("expr_str").unwrap(), "x + 1");
    let v = json!("x");
    assert_eq!(RawArg::Json(&v).string("expr_str").unwrap(), "x");
    let v = json!(3);
    let err = RawArg::Json(&v).string("expr_str").unwrap_err();
    assert_eq!(err.to_string(), "argument 'expr_str' must be a string");
}

#[test]
fn test_boolean_accessor() {
    assert!(RawArg::Text("true").boolean("population").unwrap());
    assert!(!RawArg::Text("false").boolean("population").unwrap());
    let v = json!(true);
    assert!(RawArg::Json(&v).boolean("population").unwrap());
    let err = RawArg::Text("yes").boolean("population").unwrap_err();
    assert_eq!(err.to_string(), "argument 'population' must be a boolean");
}

#[test]
fn test_expression_text_capitalizes_bool_and_null() {
    let v = json!(true);
    assert_eq!(RawArg::Json(&v).expr_text(), "True");
    let v = json!(false);
    assert_eq!(RawArg::Json(&v).expr_text(), "False");
    let v = Value::Null;
    assert_eq!(RawArg::Json(&v).expr_text(), "None");
    let v = json!(2.5);
    assert_eq!(RawArg::Json(&v).expr_text(), "2.5");
    let v = json!("x + 1");
    assert_eq!(RawArg::Json(&v).expr_text(), "x + 1");
}

#[test]
fn test_big_integer_accessor() {
    use num_bigint::BigInt;
    let huge = "123456789012345678901234567890";
    assert_eq!(
        RawArg::Text(huge).big_integer("n").unwrap(),
        BigInt::parse_bytes(huge.as_bytes(), 10).unwrap()
    );
    let v = json!(1000.0);
    assert_eq!(RawArg::Json(&v).big_integer("n").unwrap(), BigInt::from(1000));
}

#[test]
fn test_json_array_and_object_accessors() {
    assert_eq!(
        RawArg::Text("[1, 2]").json_array("rows").unwrap(),
        vec![json!(1), json!(2)]
    );
    let err = RawArg::Text("nope").json_array("rows").unwrap_err();
    assert_eq!(err.to_string(), "argument 'rows' must be a JSON array");

    let map = RawArg::Text(r#"{"x": 1}"#).json_object("substitutions").unwrap();
    assert_eq!(map.get("x"), Some(&json!(1)));
    let err = RawArg::Text("2").json_object("substitutions").unwrap_err();
    assert_eq!(
        err.to_string(),
        "argument 'substitutions' must be a JSON object"
    );
}

#[test]
fn test_positional_parameters_bind_in_order() {
    let binding = ArgumentBinding::from_raw(&args(&["2", "3"]));
    let mut params = Params::new("subtract", &binding);
    let a = params.required("a").unwrap().string("a").unwrap();
    let b = params.required("b").unwrap().string("b").unwrap();
    params.finish().unwrap();
    assert_eq!((a.as_str(), b.as_str()), ("2", "3"));
}

#[test]
fn test_missing_required_parameter() {
    let binding = ArgumentBinding::from_raw(&args(&["2"]));
    let mut params = Params::new("subtract", &binding);
    params.required("a").unwrap();
    let err = params.required("b").unwrap_err();
    assert_eq!(
        err.to_string(),
        "subtract() missing 1 required positional argument: 'b'"
    );
}

#[test]
fn test_surplus_positional_arguments() {
    let binding = ArgumentBinding::from_raw(&args(&["1", "2", "3"]));
    let mut params = Params::new("subtract", &binding);
    params.required("a").unwrap();
    params.required("b").unwrap();
    let err = params.finish().unwrap_err();
    assert_eq!(
        err.to_string(),
        "subtract() takes 2 positional arguments but 3 were given"
    );
}

#[test]
fn test_surplus_with_optional_parameters_reports_a_range() {
    let binding = ArgumentBinding::from_raw(&args(&["x**2", "x", "1", "extra"]));
    let mut params = Params::new("derivative", &binding);
    params.required("expr_str").unwrap();
    params.optional("var_str").unwrap();
    params.optional("order").unwrap();
    let err = params.finish().unwrap_err();
    assert_eq!(
        err.to_string(),
        "derivative() takes from 1 to 3 positional arguments but 4 were given"
    );
}

#[test]
fn test_keyword_binding_by_name() {
    let binding =
        ArgumentBinding::from_raw(&args(&[r#"{"var_str": "y", "expr_str": "y**2"}"#]));
    let mut params = Params::new("derivative", &binding);
    let expr = params.required("expr_str").unwrap().string("expr_str").unwrap();
    let var = params.optional("var_str").unwrap().unwrap().string("var_str").unwrap();
    assert_eq!(params.optional("order").unwrap().map(|_| ()), None);
    params.finish().unwrap();
    assert_eq!((expr.as_str(), var.as_str()), ("y**2", "y"));
}

#[test]
fn test_unexpected_keyword_argument() {
    let binding = ArgumentBinding::from_raw(&args(&[r#"{"expr_str": "x", "bogus": 1}"#]));
    let mut params = Params::new("simplify", &binding);
    params.required("expr_str").unwrap();
    let err = params.finish().unwrap_err();
    assert_eq!(
        err.to_string(),
        "simplify() got an unexpected keyword argument 'bogus'"
    );
}

#[test]
fn test_keyword_binding_missing_required() {
    let binding = ArgumentBinding::from_raw(&args(&[r#"{"variable_str": "x"}"#]));
    let mut params = Params::new("solve", &binding);
    let err = params.required("equation_str").unwrap_err();
    assert_eq!(
        err.to_string(),
        "solve() missing 1 required positional argument: 'equation_str'"
    );
}

#[test]
fn test_rest_consumes_the_tail() {
    let binding = ArgumentBinding::from_raw(&args(&["x*y", "x", "y"]));
    let mut params = Params::new("partial", &binding);
    params.required("expr_str").unwrap();
    let tail = params.rest();
    assert_eq!(tail.len(), 2);
    params.finish().unwrap();
}

#[test]
fn test_list_binding_feeds_parameters_element_wise() {
    let binding = ArgumentBinding::from_raw(&args(&["[10, 4]"]));
    let mut params = Params::new("subtract", &binding);
    let a = params.required("a").unwrap().expr_text();
    let b = params.required("b").unwrap().expr_text();
    params.finish().unwrap();
    assert_eq!((a.as_str(), b.as_str()), ("10", "4"));
}

#[test]
fn test_whole_list_takes_every_remaining_element() {
    let binding = ArgumentBinding::from_raw(&args(&["[1, 2, 3]"]));
    let mut params = Params::new("mean", &binding);
    let values = params.whole_list("numbers").unwrap();
    params.finish().unwrap();
    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn test_whole_list_from_positional_text() {
    let binding = ArgumentBinding::from_raw(&args(&["[1, 2]", "oops"]));
    let mut params = Params::new("mean", &binding);
    let values = params.whole_list("numbers").unwrap();
    assert_eq!(values.len(), 2);
    let err = params.finish().unwrap_err();
    assert_eq!(
        err.to_string(),
        "mean() takes 1 positional arguments but 2 were given"
    );
}

#[test]
fn test_whole_list_missing_under_keywords() {
    let binding = ArgumentBinding::from_raw(&args(&[r#"{"population": true}"#]));
    let mut params = Params::new("mean", &binding);
    let err = params.whole_list("numbers").unwrap_err();
    assert_eq!(
        err.to_string(),
        "mean() missing 1 required positional argument: 'numbers'"
    );
}
