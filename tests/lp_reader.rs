use std::collections::BTreeMap;
use std::io::Write;

use approx::assert_relative_eq;

use lp_model::constraint::ConstraintSense;
use lp_model::error::{NameRule, ReadError};
use lp_model::lp_reader::{
    find_problem_name, mathify_expression, parse_bounds, parse_constraints, parse_named_expression,
    parse_term, parse_variable_list, read_lp, read_lp_file, read_lp_str, remove_comments, split_sections,
    Coefficients, ParsedConstraint,
};
use lp_model::objective::ObjectiveSense;
use lp_model::problem::Problem;
use lp_model::variable::VarType;

fn coefficients(terms: &[(&str, f64)]) -> Coefficients {
    terms.iter().map(|&(name, coeff)| (name.to_string(), coeff)).collect()
}

const SAMPLE: &str = "
        Maximize
         obj: x1 + 2 x2 + 3 x3 + x4 + 10
        Subject To
         c1: - x1 + x2 + x3 + 10 x4 <= 20
         c2: x1 - 3 x2 + x3 <= 30
         c3: x2 - 3.5 x4 = 0
        Bounds
         0 <= x1 <= 40
         2 <= x4 <= 3
         x3 <= 3
        General
         x4
        Binary
         x2
        End
        ";

#[test]
fn terms() {
    let cases: &[(&str, Option<&str>, f64)] = &[
        ("x", Some("x"), 1.),
        (" x ", Some("x"), 1.),
        (" 5 x ", Some("x"), 5.),
        (" -5 x ", Some("x"), -5.),
        (" + 5 x ", Some("x"), 5.),
        (" - 5 x ", Some("x"), -5.),
        (" 5.5 x2y ", Some("x2y"), 5.5),
        (" .5 x2y ", Some("x2y"), 0.5),
        (" 1.5e3 x ", Some("x"), 1500.),
        (" 1.5e03 x ", Some("x"), 1500.),
        ("  10.5e3  x2(lkj290s9_er0)y ", Some("x2(lkj290s9_er0)y"), 10500.),
        ("  - 10.5e3  x2(lkj290s9_er0)y ", Some("x2(lkj290s9_er0)y"), -10500.),
        ("1x1", Some("x1"), 1.),
        ("0", None, 0.),
        ("10", None, 10.),
        ("-10", None, -10.),
        ("  10  ", None, 10.),
        ("1e03", None, 1000.),
        ("-1e03", None, -1000.),
        ("1e-3", None, 0.001),
    ];
    for &(term, name, coeff) in cases {
        let (parsed_name, parsed_coeff) = parse_term(term).unwrap();
        assert_eq!(parsed_name.as_deref(), name, "name of {:?}", term);
        assert_relative_eq!(parsed_coeff, coeff);
    }
}

#[test]
fn invalid_terms() {
    let err = parse_term(" -5 5x").unwrap_err();
    assert_eq!(
        err.to_string(),
        "variable '5x' does not have a valid name: A variable name should not begin with a number or a period"
    );
    let err = parse_term(" -5 x y").unwrap_err();
    assert_eq!(
        err.to_string(),
        "variable 'x y' does not have a valid name: A variable name should not have whitespaces"
    );
    assert!(matches!(
        parse_term(" -5 x😂"),
        Err(ReadError::InvalidName {
            rule: NameRule::ForbiddenCharacter('😂'),
            ..
        })
    ));
}

#[test]
fn expressions() {
    let cases: &[(&str, &[(&str, f64)], f64)] = &[
        ("", &[], 0.),
        ("100", &[], 100.),
        ("x", &[("x", 1.)], 0.),
        ("- x", &[("x", -1.)], 0.),
        ("-x", &[("x", -1.)], 0.),
        ("5 x", &[("x", 5.)], 0.),
        ("5 x - 2 y + 10", &[("x", 5.), ("y", -2.)], 10.),
        (
            "5 x -2 y +3   z -  4 q +  10 -  50  ",
            &[("x", 5.), ("y", -2.), ("z", 3.), ("q", -4.)],
            -40.,
        ),
        ("5 x -2 x +  3 y -4 y +  10 -  50  ", &[("x", 3.), ("y", -1.)], -40.),
        (
            "- x1 + x2 + x3 + 10 x4",
            &[("x1", -1.), ("x2", 1.), ("x3", 1.), ("x4", 10.)],
            0.,
        ),
        ("2.5e-3 x + 1E+2", &[("x", 0.0025)], 100.),
    ];
    for &(raw, terms, constant) in cases {
        let (parsed, parsed_constant) = mathify_expression(raw).unwrap();
        assert_eq!(parsed, coefficients(terms), "terms of {:?}", raw);
        assert_relative_eq!(parsed_constant, constant);
    }
}

#[test]
fn comments() {
    assert_eq!(remove_comments("\\* this is a comment section  *\\"), "");
    assert_eq!(
        remove_comments("before \\* this is a comment section  *\\ after"),
        "before  after"
    );
    assert_eq!(remove_comments("before \\* this is a comment section"), "before ");
    assert_eq!(remove_comments("a \\ one \\ b \\ two \\ c"), "a  b  c");
}

#[test]
fn problem_name() {
    let lp = "
        \\ test problem 123 \\
        Maximize
        objective section
        ";
    assert_eq!(find_problem_name(lp), "test problem 123");
    assert_eq!(find_problem_name("\\* my_problem *\\\nMinimize"), "my_problem");
    assert_eq!(find_problem_name("Minimize\n obj: x\nEnd"), "lp_model_problem");
}

#[test]
fn named_expressions() {
    let parsed = parse_named_expression("obj: x1 + x2 + 3 x3 + 5").unwrap();
    assert_eq!(parsed.name.as_deref(), Some("obj"));
    assert_eq!(parsed.coefficients, coefficients(&[("x1", 1.), ("x2", 1.), ("x3", 3.)]));
    assert_relative_eq!(parsed.constant, 5.);

    let parsed = parse_named_expression("obj  :  - x1 + x2 + 3 x3 + 5").unwrap();
    assert_eq!(parsed.name.as_deref(), Some("obj"));
    assert_eq!(parsed.coefficients, coefficients(&[("x1", -1.), ("x2", 1.), ("x3", 3.)]));

    let parsed = parse_named_expression("x1 +\n x2").unwrap();
    assert_eq!(parsed.name, None);
    assert_eq!(parsed.coefficients, coefficients(&[("x1", 1.), ("x2", 1.)]));
}

#[test]
fn sections() {
    let lp = "
        Maximize
        objective section
        Subject To
        constraints section
        Bounds
        bounds section
        Binary
        binaries section
        Generals
        generals section
        End
        ";
    let sections = split_sections(lp).unwrap();
    assert!(sections.is_maximize);
    assert_eq!(sections.objective, "objective section");
    assert_eq!(sections.constraints, Some("constraints section"));
    assert_eq!(sections.bounds, Some("bounds section"));
    assert_eq!(sections.generals, Some("generals section"));
    assert_eq!(sections.binaries, Some("binaries section"));
}

#[test]
fn sections_in_any_order() {
    let lp = "
        MINIMIZE
        objective section
        st
        constraints section
        Binary
        binaries section
        Generals
        generals section
        Bounds
        bounds section
        End
        ";
    let sections = split_sections(lp).unwrap();
    assert!(!sections.is_maximize);
    assert_eq!(sections.objective, "objective section");
    assert_eq!(sections.constraints, Some("constraints section"));
    assert_eq!(sections.bounds, Some("bounds section"));
    assert_eq!(sections.generals, Some("generals section"));
    assert_eq!(sections.binaries, Some("binaries section"));
}

#[test]
fn minimal_sections() {
    let sections = split_sections("\n Maximize\n objective section\n End\n").unwrap();
    assert!(sections.is_maximize);
    assert_eq!(sections.objective, "objective section");
    assert_eq!(sections.constraints, None);
    assert_eq!(sections.bounds, None);
    assert_eq!(sections.generals, None);
    assert_eq!(sections.binaries, None);
}

#[test]
fn missing_sections() {
    let err = split_sections("\n Maximize\n objective section\n").unwrap_err();
    assert_eq!(err.to_string(), "file must end with an \"end\" keyword");

    let err = split_sections("{\n \"foo\": \"bar\"\n}").unwrap_err();
    assert_eq!(err.to_string(), "file must start with an objective");
}

#[test]
fn single_constraint() {
    let expected = vec![ParsedConstraint {
        name: Some("c1".to_string()),
        lhs: coefficients(&[("x1", 1.), ("y", 3.)]),
        lhs_const: 0.,
        sense: ConstraintSense::Leq,
        rhs: Coefficients::new(),
        rhs_const: 20.,
    }];
    for raw in [
        "c1 : 1x1 + 3y <= 20",
        "  c1   :  1x1 + 3y <= 20",
        "c1 : 1x1 + 3y \n <= 20",
        "c1 : \n 1x1 \n + 3y \n <= 20 \n",
        "c1 : 1x1 + 3y =< 20",
        "c1 : 1x1 + 3y < 20",
    ] {
        assert_eq!(parse_constraints(raw).unwrap(), expected, "{:?}", raw);
    }

    let unnamed = parse_constraints("1x1 + 3y <= 20").unwrap();
    assert_eq!(unnamed[0].name, None);
    assert_eq!(unnamed[0].lhs, expected[0].lhs);
}

#[test]
fn multiline_constraints() {
    let raw = " c1: - x1 + x2 + x3 + 10 x4 + 10<= 20\n c2: x1 - 3 x2 + x3 >= 30\n c3: x2 - 3.5 x4 = 0\n c4: x1 => 2 x2 - 1\n";
    let parsed = parse_constraints(raw).unwrap();
    assert_eq!(parsed.len(), 4);

    assert_eq!(parsed[0].name.as_deref(), Some("c1"));
    assert_eq!(
        parsed[0].lhs,
        coefficients(&[("x1", -1.), ("x2", 1.), ("x3", 1.), ("x4", 10.)])
    );
    assert_relative_eq!(parsed[0].lhs_const, 10.);
    assert_eq!(parsed[0].sense, ConstraintSense::Leq);
    assert_relative_eq!(parsed[0].rhs_const, 20.);

    assert_eq!(parsed[1].name.as_deref(), Some("c2"));
    assert_eq!(parsed[1].lhs, coefficients(&[("x1", 1.), ("x2", -3.), ("x3", 1.)]));
    assert_eq!(parsed[1].sense, ConstraintSense::Geq);
    assert_relative_eq!(parsed[1].rhs_const, 30.);

    assert_eq!(parsed[2].name.as_deref(), Some("c3"));
    assert_eq!(parsed[2].lhs, coefficients(&[("x2", 1.), ("x4", -3.5)]));
    assert_eq!(parsed[2].sense, ConstraintSense::Eq);
    assert_relative_eq!(parsed[2].rhs_const, 0.);

    assert_eq!(parsed[3].sense, ConstraintSense::Geq);
    assert_eq!(parsed[3].rhs, coefficients(&[("x2", 2.)]));
    assert_relative_eq!(parsed[3].rhs_const, -1.);
}

#[test]
fn constraint_without_operator() {
    let err = parse_constraints("c1: x + y <= 3\nc2: x - y").unwrap_err();
    assert_eq!(err.to_string(), "constraint c2: x - y doesn't appear to be valid");
}

#[test]
fn bounds() {
    let raw = " x1 free\n x2 = 5\n x3 <= 40\n x4 >= 20\n 80 >= x5 >= 30\n 30 <= x6 <= 80\n\n 40 <=\n  x7 <=\n90\n100\n>= x8\n>= 50\n x9 >= -inf\n";
    let parsed = parse_bounds(raw).unwrap();
    assert_eq!(parsed.len(), 9);

    assert_eq!(parsed["x1"].lower, Some(f64::NEG_INFINITY));
    assert_eq!(parsed["x1"].upper, Some(f64::INFINITY));
    assert_eq!(parsed["x2"].lower, Some(5.));
    assert_eq!(parsed["x2"].upper, Some(5.));
    assert_eq!(parsed["x3"].lower, None);
    assert_eq!(parsed["x3"].upper, Some(40.));
    assert_eq!(parsed["x4"].lower, Some(20.));
    assert_eq!(parsed["x4"].upper, None);
    assert_eq!(parsed["x5"].lower, Some(30.));
    assert_eq!(parsed["x5"].upper, Some(80.));
    assert_eq!(parsed["x6"].lower, Some(30.));
    assert_eq!(parsed["x6"].upper, Some(80.));
    assert_eq!(parsed["x7"].lower, Some(40.));
    assert_eq!(parsed["x7"].upper, Some(90.));
    assert_eq!(parsed["x8"].lower, Some(50.));
    assert_eq!(parsed["x8"].upper, Some(100.));
    assert_eq!(parsed["x9"].lower, Some(f64::NEG_INFINITY));
}

#[test]
fn invalid_bounds() {
    assert!(matches!(parse_bounds("x1 <="), Err(ReadError::InvalidBound(_))));
    assert!(matches!(parse_bounds("x1 <= x2"), Err(ReadError::InvalidBound(_))));
    assert!(matches!(parse_bounds("<= 3 x1"), Err(ReadError::InvalidBound(_))));
    assert!(matches!(parse_bounds("x1 <= nan"), Err(ReadError::InvalidNumber(_))));
}

#[test]
fn bounds_on_names_that_look_like_numbers() {
    let parsed = parse_bounds("inf <= 5\n -inf <= nan <= 3\n 2 <= Infinity\n free free\n x <= inf\n").unwrap();
    assert_eq!(parsed.len(), 5);
    assert_eq!(parsed["inf"].lower, None);
    assert_eq!(parsed["inf"].upper, Some(5.));
    assert_eq!(parsed["nan"].lower, Some(f64::NEG_INFINITY));
    assert_eq!(parsed["nan"].upper, Some(3.));
    assert_eq!(parsed["Infinity"].lower, Some(2.));
    assert_eq!(parsed["Infinity"].upper, None);
    assert_eq!(parsed["free"].lower, Some(f64::NEG_INFINITY));
    assert_eq!(parsed["free"].upper, Some(f64::INFINITY));
    assert_eq!(parsed["x"].upper, Some(f64::INFINITY));

    assert!(matches!(parse_bounds("nan >= x"), Err(ReadError::InvalidNumber(_))));
    assert!(matches!(
        parse_bounds("3 <= 2x"),
        Err(ReadError::InvalidName { ref name, .. }) if name == "2x"
    ));
}

#[test]
fn variable_lists() {
    let raw = "\n x1\n  x2\n x3\n\n   x4 \nx5  \nx6\n";
    assert_eq!(
        parse_variable_list(raw).unwrap(),
        vec!["x1", "x2", "x3", "x4", "x5", "x6"]
    );
    assert!(parse_variable_list("x1 2x").is_err());
}

#[test]
fn variable_types() {
    let problem = read_lp_str(SAMPLE).unwrap();
    assert_eq!(problem.name(), "lp_model_problem");

    let x1 = problem.variable("x1").unwrap();
    assert_eq!(x1.low_bound(), Some(0.));
    assert_eq!(x1.up_bound(), Some(40.));
    assert_eq!(x1.var_type(), VarType::Continuous);

    let x2 = problem.variable("x2").unwrap();
    assert_eq!(x2.low_bound(), Some(0.));
    assert_eq!(x2.up_bound(), Some(1.));
    assert_eq!(x2.var_type(), VarType::Binary);

    let x3 = problem.variable("x3").unwrap();
    assert_eq!(x3.low_bound(), Some(0.));
    assert_eq!(x3.up_bound(), Some(3.));
    assert_eq!(x3.var_type(), VarType::Continuous);

    let x4 = problem.variable("x4").unwrap();
    assert_eq!(x4.low_bound(), Some(2.));
    assert_eq!(x4.up_bound(), Some(3.));
    assert_eq!(x4.var_type(), VarType::Integer);
}

#[test]
fn objective() {
    let problem = read_lp_str(SAMPLE).unwrap();
    let objective = problem.objective().unwrap();
    assert_eq!(objective.name(), "obj");
    assert_eq!(objective.sense(), ObjectiveSense::Maximize);
    assert_relative_eq!(objective.constant(), 10.);
    let terms: BTreeMap<_, _> = objective
        .terms()
        .map(|(variable, coeff)| (variable.name().to_string(), coeff))
        .collect();
    assert_eq!(
        terms,
        coefficients(&[("x1", 1.), ("x2", 2.), ("x3", 3.), ("x4", 1.)])
    );
    assert_relative_eq!(problem.variable("x3").unwrap().obj_coeff(), 3.);
}

#[test]
fn constraints_share_variables() {
    let problem = read_lp_str(SAMPLE).unwrap();
    assert_eq!(
        problem.constraints().map(|c| c.name()).collect::<Vec<_>>(),
        vec!["c1", "c2", "c3"]
    );
    let c3 = problem.constraint("c3").unwrap();
    assert_eq!(c3.sense(), ConstraintSense::Eq);
    let x4 = problem.variable("x4").unwrap();
    assert_relative_eq!(c3.lhs().coefficient(x4), -3.5);
    assert_relative_eq!(problem.constraint("c1").unwrap().lhs().coefficient(x4), 10.);
}

#[test]
fn unnamed_constraints_and_declared_only_variables() {
    let lp = "\\* generated *\\
Minimize
 x + y
Subject To
 x + y >= 1
 c2: x - y <= 4
 x <= 3
Bounds
 z free
Generals
 w
End
";
    let problem = read_lp_str(lp).unwrap();
    assert_eq!(problem.name(), "generated");
    assert_eq!(problem.objective().unwrap().name(), "");
    assert_eq!(
        problem.constraints().map(|c| c.name()).collect::<Vec<_>>(),
        vec!["c1", "c2", "c3"]
    );
    assert!(problem.variable("z").unwrap().is_free());
    assert_eq!(problem.variable("w").unwrap().var_type(), VarType::Integer);
}

#[test]
fn invalid_constraint_is_reported_with_its_text() {
    let lp = "
        Maximize
         obj: x1 + 2 x2 + 3 x3 + x4 + 10
        Subject To
         c1: - x1 + x2 + x3 + 10 x4
         c2: x1 - 3 x2 + x3 <= 30
         c3: x2 - 3.5 x4 = 0
        End
        ";
    let err = read_lp_str(lp).unwrap_err();
    assert_eq!(
        err.to_string(),
        "constraint c1: - x1 + x2 + x3 + 10 x4\n         c2: x1 - 3 x2 + x3 <= 30 doesn't appear to be valid"
    );
}

#[test]
fn inconsistent_bounds() {
    let lp = "Minimize\n x\nBounds\n 5 <= x <= 1\nEnd";
    assert!(matches!(
        read_lp_str(lp),
        Err(ReadError::InvalidVariableBound { ref name, .. }) if name == "x"
    ));
}

#[test]
fn read_from_handles() {
    let problem = read_lp(SAMPLE.as_bytes()).unwrap();
    assert_eq!(problem.variables().count(), 4);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    let problem = read_lp_file(file.path()).unwrap();
    assert_eq!(problem.constraints().count(), 3);

    let problem: Problem = SAMPLE.parse().unwrap();
    assert_eq!(problem.objective().unwrap().sense(), ObjectiveSense::Maximize);

    assert!(matches!(
        read_lp_file("/nonexistent/problem.lp"),
        Err(ReadError::Io(_))
    ));
}
