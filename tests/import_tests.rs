//! Recursive imports: `@MaterialLaw`, `@MFront`, `@Import`, and the
//! whole-file driver

use std::path::Path;

use matforge::project::{self, Analysis};
use matforge::{BehaviourDsl, CompilerOptions};

const YOUNG_MODULUS: &str = r#"
@Parser MaterialLaw;
@Law YoungModulus;
@Material UO2;
@Input T;
@Function {
  res = 2.2693e11 * (1. - 2.e-4 * (T - 273.15)) ;
}
"#;

const POISSON_RATIO: &str = r#"
@Parser MaterialLaw;
@Law PoissonRatio;
@Material UO2;
@Input T;
@Function {
  res = 0.3 + 1.e-5 * T ;
}
"#;

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn options_with_search(dir: &Path) -> CompilerOptions {
    let mut options = CompilerOptions::new();
    options.search.add(dir);
    options.output_directory = dir.to_owned();
    options
}

#[test]
fn test_material_law_import_reserves_names_and_includes_header() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "YoungModulus.mfront", YOUNG_MODULUS);

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    dsl.analyse_string(
        "@Behaviour Elasticity;\n@MaterialLaw \"YoungModulus.mfront\";",
        "Elasticity.mfront",
    )
    .unwrap();

    let engine = dsl.engine();
    assert_eq!(engine.material_laws(), ["UO2_YoungModulus"]);
    assert!(engine.is_name_reserved("UO2_YoungModulus"));
    assert!(engine.is_name_reserved("UO2_YoungModulus_checkBounds"));
    assert!(engine.is_name_reserved("UO2_YoungModulus_bounds_check_status"));
    assert!(
        dsl.description()
            .includes()
            .contains("#include\"UO2_YoungModulus-mfront.hxx\"")
    );
}

#[test]
fn test_two_material_law_imports_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "YoungModulus.mfront", YOUNG_MODULUS);
    write_file(dir.path(), "PoissonRatio.mfront", POISSON_RATIO);

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    dsl.analyse_string(
        "@MaterialLaw {\"YoungModulus.mfront\", \"PoissonRatio.mfront\"};",
        "Elasticity.mfront",
    )
    .unwrap();
    assert_eq!(
        dsl.engine().material_laws(),
        ["UO2_YoungModulus", "UO2_PoissonRatio"]
    );
}

#[test]
fn test_importing_the_same_law_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "YoungModulus.mfront", YOUNG_MODULUS);

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    let err = dsl
        .analyse_string(
            "@MaterialLaw \"YoungModulus.mfront\";\n@MaterialLaw \"YoungModulus.mfront\";",
            "Elasticity.mfront",
        )
        .expect_err("duplicate import unexpectedly succeeded");
    assert!(err.message.contains("reserved"), "{err}");
    // the delegated failure names the outer file and the imported one
    assert!(err.message.contains("Elasticity.mfront"), "{err}");
    assert!(err.message.contains("YoungModulus.mfront"), "{err}");
}

#[test]
fn test_material_law_import_failure_carries_outer_context() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "Broken.mfront", "@Parser MaterialLaw;\n@Law L;");

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    let err = dsl
        .analyse_string("@MaterialLaw \"Broken.mfront\";", "Outer.mfront")
        .expect_err("broken import unexpectedly succeeded");
    assert!(err.message.contains("Outer.mfront"), "{err}");
    assert!(err.message.contains("Broken.mfront"), "{err}");
    assert!(err.message.contains("no function"), "{err}");
}

#[test]
fn test_material_law_targets_merged_with_cross_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "YoungModulus.mfront", YOUNG_MODULUS);

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    dsl.analyse_string(
        "@Behaviour Elasticity;\n@MaterialLaw \"YoungModulus.mfront\";",
        "Elasticity.mfront",
    )
    .unwrap();
    let targets = dsl.targets_description().unwrap();
    // the imported law's library is merged in
    let laws = targets.library("MaterialLaws").unwrap();
    assert_eq!(laws.sources, ["UO2_YoungModulus-mfront.cxx"]);
    // and the behaviour library depends on it
    let behaviour = targets.library("MaterialBehaviour").unwrap();
    assert!(behaviour.dependencies.contains(&"MaterialLaws".to_owned()));
    assert_eq!(behaviour.sources, ["Elasticity.cxx"]);
}

#[test]
fn test_mfront_keyword_merges_targets_by_union() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "YoungModulus.mfront", YOUNG_MODULUS);
    write_file(dir.path(), "PoissonRatio.mfront", POISSON_RATIO);

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    dsl.analyse_string(
        "@MFront {{\"YoungModulus.mfront\", \"PoissonRatio.mfront\"}, \"mfront\"};",
        "All.mfront",
    )
    .unwrap();
    let targets = dsl.targets_description().unwrap();
    let laws = targets.library("MaterialLaws").unwrap();
    assert_eq!(
        laws.sources,
        ["UO2_YoungModulus-mfront.cxx", "UO2_PoissonRatio-mfront.cxx"]
    );
}

#[test]
fn test_import_reenters_the_same_dsl() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "common.mfront",
        "@MaterialProperty real young; // shared elastic property\n",
    );

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    dsl.analyse_string(
        "@Import \"common.mfront\";\n@StateVariable real p;",
        "Norton.mfront",
    )
    .unwrap();
    let mb = dsl.description();
    assert!(mb.is_material_property_name("young"));
    assert!(mb.is_state_variable_name("p"));
    // the outer file name is restored after the import
    assert_eq!(dsl.engine().file_name(), "Norton.mfront");
}

#[test]
fn test_import_failure_restores_outer_source() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "broken.mfront", "@StateVariable real;");

    let mut dsl = BehaviourDsl::default_small_strain(options_with_search(dir.path())).unwrap();
    let err = dsl
        .analyse_string("@Import \"broken.mfront\";", "Norton.mfront")
        .expect_err("broken import unexpectedly succeeded");
    assert!(err.message.contains("broken.mfront"), "{err}");
    assert_eq!(dsl.engine().file_name(), "Norton.mfront");
}

#[test]
fn test_read_specified_values() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "law.mfront", YOUNG_MODULUS);
    let values =
        project::read_specified_values(&dir.path().join("law.mfront"), &["@Parser", "@Law"])
            .unwrap();
    assert_eq!(values, ["MaterialLaw", "YoungModulus"]);
}

#[test]
fn test_read_specified_values_mid_instruction_keyword_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "law.mfront", "@Author John @Parser MaterialLaw;");
    let err = project::read_specified_values(&dir.path().join("law.mfront"), &["@Parser"])
        .expect_err("mid-instruction keyword unexpectedly accepted");
    assert!(
        err.to_string().contains("does not begin a new instruction"),
        "{err}"
    );
}

#[test]
fn test_driver_selects_dsl_from_parser_keyword() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "law.mfront", YOUNG_MODULUS);
    write_file(dir.path(), "behaviour.mfront", "@Behaviour Norton;");

    let options = options_with_search(dir.path());
    match project::analyse_file(&dir.path().join("law.mfront"), &[], &options).unwrap() {
        Analysis::MaterialProperty(dsl) => {
            assert_eq!(dsl.description().law_name(), "YoungModulus");
        }
        Analysis::Behaviour(_) => panic!("expected a material property"),
    }
    match project::analyse_file(&dir.path().join("behaviour.mfront"), &[], &options).unwrap() {
        Analysis::Behaviour(dsl) => {
            assert_eq!(dsl.description().behaviour_name(), "Norton");
        }
        Analysis::MaterialProperty(_) => panic!("expected a behaviour"),
    }
}

#[test]
fn test_driver_unknown_dsl_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "odd.mfront", "@Parser NoSuchDSL;");
    let err = project::analyse_file(
        &dir.path().join("odd.mfront"),
        &[],
        &CompilerOptions::new(),
    )
    .expect_err("unknown dsl unexpectedly accepted");
    assert!(err.to_string().contains("unknown dsl 'NoSuchDSL'"), "{err}");
}

#[test]
fn test_driver_generate_writes_files_and_returns_targets() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "law.mfront", YOUNG_MODULUS);
    let options = options_with_search(dir.path());
    let targets =
        project::generate(&dir.path().join("law.mfront"), &["cyrano"], &options).unwrap();
    assert!(targets.library("CyranoMaterialLaws").is_some());
    assert!(dir.path().join("UO2_YoungModulus-cyrano.cxx").is_file());
    assert!(dir.path().join("UO2_YoungModulus-cyrano.hxx").is_file());
}

#[test]
fn test_missing_file_is_a_file_error() {
    let err = project::analyse_file(
        Path::new("/nonexistent/behaviour.mfront"),
        &[],
        &CompilerOptions::new(),
    )
    .expect_err("missing file unexpectedly accepted");
    assert!(matches!(err, matforge::DslError::File { .. }));
}
