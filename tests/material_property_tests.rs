//! End-to-end tests of the material-property DSL

use matforge::{CompilerOptions, MaterialPropertyDsl};

const YOUNG_MODULUS: &str = r#"
@Parser MaterialLaw;
@Law YoungModulus;
@Material UO2;
@Author Jane Doe;
@Input T;
@Parameter tref = 273.15;
@Bounds T in [273.15:2610.15];
@Function {
  res = 2.2693e11 * (1. - 2.e-4 * (T - tref)) ;
}
"#;

fn parse(source: &str) -> MaterialPropertyDsl {
    let mut dsl = MaterialPropertyDsl::new(CompilerOptions::new());
    dsl.analyse_string(source, "test.mfront")
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
    dsl
}

fn parse_err(source: &str) -> matforge::ParseError {
    let mut dsl = MaterialPropertyDsl::new(CompilerOptions::new());
    dsl.analyse_string(source, "test.mfront")
        .expect_err("parse unexpectedly succeeded")
}

#[test]
fn test_young_modulus_law() {
    let dsl = parse(YOUNG_MODULUS);
    let mpd = dsl.description();
    assert_eq!(mpd.law_name(), "YoungModulus");
    assert_eq!(mpd.material_name(), "UO2");
    assert_eq!(mpd.material_law_name(), "UO2_YoungModulus");
    assert_eq!(dsl.engine().file().author, "Jane Doe");
    assert!(mpd.is_input_name("T"));
    assert!(mpd.is_parameter_name("tref"));
    assert_eq!(mpd.parameters_values()["tref"], 273.15);
    assert_eq!(mpd.bounds().len(), 1);
    assert_eq!(mpd.output_name(), "res");
    let f = mpd.function();
    assert!(f.code.contains("#line"));
    assert!(f.code.contains("res = 2.2693e11"));
    assert!(f.members.contains("T"));
    assert!(f.members.contains("res"));
    // members of the generated C function stay unqualified
    assert!(!f.code.contains("this->"));
}

#[test]
fn test_output_rename() {
    let dsl = parse(
        "@Law L;\n@Output E;\n@Function { E = 1. ; }",
    );
    assert_eq!(dsl.description().output_name(), "E");
}

#[test]
fn test_missing_law_name_fails() {
    let err = parse_err("@Function { res = 1. ; }");
    assert!(err.message.contains("no law name"), "{err}");
}

#[test]
fn test_missing_function_fails() {
    let err = parse_err("@Law L;");
    assert!(err.message.contains("no function"), "{err}");
}

#[test]
fn test_function_defined_twice_fails() {
    let err = parse_err(
        "@Law L;\n@Function { res = 1. ; }\n@Function { res = 2. ; }",
    );
    assert!(err.message.contains("function already defined"), "{err}");
}

#[test]
fn test_input_collides_with_parameter_fails() {
    let err = parse_err("@Law L;\n@Input T;\n@Parameter T = 1.;");
    assert!(err.message.contains("already declared"), "{err}");
}

#[test]
fn test_inputs_cannot_be_arrays() {
    let err = parse_err("@Law L;\n@Input T[2];");
    assert!(err.message.contains("can't be declared an array"), "{err}");
}

#[test]
fn test_constant_declaration() {
    let dsl = parse("@Law L;\n@Constant C = 3.2;\n@Function { res = C ; }");
    let statics = dsl.description().static_variables();
    assert_eq!(statics.len(), 1);
    assert_eq!(statics[0].name, "C");
}

#[test]
fn test_bounds_on_unknown_input_fails() {
    let err = parse_err("@Law L;\n@Bounds T in [0:1];\n@Function { res = 1. ; }");
    assert!(err.message.contains("no input named 'T'"), "{err}");
}

#[test]
fn test_generation_writes_interface_files() {
    let out = tempfile::tempdir().unwrap();
    let mut options = CompilerOptions::new();
    options.output_directory = out.path().to_owned();
    let mut dsl = MaterialPropertyDsl::new(options);
    dsl.analyse_string(
        &format!("{YOUNG_MODULUS}\n@Interface cyrano, mfront;"),
        "YoungModulus.mfront",
    )
    .unwrap();

    let targets = dsl.targets_description().unwrap();
    let lib = targets.library("CyranoMaterialLaws").unwrap();
    assert_eq!(lib.sources, ["UO2_YoungModulus-cyrano.cxx"]);
    assert_eq!(lib.entry_points, ["cyrano_UO2_YoungModulus"]);
    assert!(targets.library("MaterialLaws").is_some());

    dsl.write_output_files().unwrap();
    let cyrano_src =
        std::fs::read_to_string(out.path().join("UO2_YoungModulus-cyrano.cxx")).unwrap();
    assert!(cyrano_src.contains("double cyrano_UO2_YoungModulus"));
    assert!(cyrano_src.contains("const double T = cyrano_params[0];"));
    assert!(cyrano_src.contains("#line"));
    assert!(cyrano_src.contains("return res;"));
    let mfront_header =
        std::fs::read_to_string(out.path().join("UO2_YoungModulus-mfront.hxx")).unwrap();
    assert!(mfront_header.contains("double UO2_YoungModulus(const double T);"));
    assert!(mfront_header.contains("UO2_YoungModulus_checkBounds"));
}

#[test]
fn test_strict_policy_guards_generated_function() {
    let out = tempfile::tempdir().unwrap();
    let mut options = CompilerOptions::new();
    options.output_directory = out.path().to_owned();
    let mut dsl = MaterialPropertyDsl::new(options);
    dsl.analyse_string(
        &format!("{YOUNG_MODULUS}\n@OutOfBoundsPolicy Strict;\n@Interface cyrano;"),
        "YoungModulus.mfront",
    )
    .unwrap();
    dsl.write_output_files().unwrap();
    let src = std::fs::read_to_string(out.path().join("UO2_YoungModulus-cyrano.cxx")).unwrap();
    assert!(src.contains("checkBounds"));
    assert!(src.contains("nan("));
}
