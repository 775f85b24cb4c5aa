use artixform::engine::{
    artifact_id_for, discover_components, glob_match, path_relative_to, should_include_artifact,
};
use artixform::publish::{ModuleMetadataWriter, Publication, SoftwareComponent, UsageContext};
use artixform::toolchain::{Installation, StaticToolchainRegistry, ToolchainQueryService};
use artixform::transform::steps::{StepDirs, parse_step};
use artixform::transform::{TransformDependencies, TransformStep};
use artixform::utils::{
    PackagePaths, Settings, WorkerThreadLimits, apply_settings_to_opts, load_settings,
    workers_for_fd_limit, write_atomically,
};
use artixform::{ArtifactId, Attributes, ComponentId, Opts};
use std::fs;
use std::path::{Path, PathBuf};

/// Fresh scratch directory for one test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "artixform-test-{}-{}",
        std::process::id(),
        name
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

// --- path_relative_to ---

#[test]
fn test_path_relative_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/foo/bar/baz/qux");
    assert_eq!(
        path_relative_to(&path, &base),
        Some(PathBuf::from("baz/qux"))
    );
}

#[test]
fn test_path_relative_not_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/other/qux");
    assert_eq!(path_relative_to(&path, &base), None);
}

// --- glob_match / should_include_artifact ---

#[test]
fn test_glob_match_literal() {
    assert!(glob_match("node_modules", "node_modules"));
    assert!(!glob_match("node_modules", "node_module"));
}

#[test]
fn test_glob_match_star() {
    assert!(glob_match("*.log", "foo.log"));
    assert!(glob_match("*.log", ".log"));
    assert!(!glob_match("*.log", "foo.log.txt"));
    assert!(glob_match("node_*", "node_modules"));
}

#[test]
fn test_glob_match_question_mark() {
    assert!(glob_match("lib?.jar", "lib1.jar"));
    assert!(!glob_match("lib?.jar", "lib.jar"));
}

#[test]
fn test_glob_match_negation_stripped() {
    assert!(glob_match("!node_modules", "node_modules"));
}

#[test]
fn test_should_include_root_excluded() {
    let root = PathBuf::from("/foo");
    assert!(!should_include_artifact(&root, &root, None, &[]));
}

#[test]
fn test_should_include_out_dir_skipped() {
    let root = PathBuf::from("/foo");
    let out = PathBuf::from("/foo/artixform-out");
    let produced = out.join("app/a.jar");
    assert!(!should_include_artifact(&produced, &root, Some(out.as_path()), &[]));
}

#[test]
fn test_should_include_os_hidden_skipped() {
    let root = PathBuf::from("/foo");
    assert!(!should_include_artifact(
        &PathBuf::from("/foo/app/.DS_Store"),
        &root,
        None,
        &[]
    ));
}

#[test]
fn test_should_include_exclude_pattern_glob() {
    let root = PathBuf::from("/foo");
    let path = PathBuf::from("/foo/bar/baz.log");
    assert!(!should_include_artifact(
        &path,
        &root,
        None,
        &["*.log".to_string()]
    ));
}

#[test]
fn test_should_include_not_excluded() {
    let root = PathBuf::from("/foo");
    let path = PathBuf::from("/foo/bar/baz.jar");
    assert!(should_include_artifact(
        &path,
        &root,
        None,
        &["*.log".to_string(), "node_modules".to_string()]
    ));
}

// --- identities and attributes ---

#[test]
fn test_artifact_id_display_and_file_name() {
    let id = ArtifactId::new(ComponentId::new("app"), "core", "jar").with_classifier("sources");
    assert_eq!(id.file_name(), "core-sources.jar");
    assert_eq!(id.to_string(), "core-sources.jar (app)");
}

#[test]
fn test_artifact_id_for_nested_file() {
    let id = artifact_id_for(&ComponentId::new("app"), Path::new("lib/util.jar"));
    assert_eq!(id.name, "lib/util");
    assert_eq!(id.extension, "jar");
}

#[test]
fn test_attributes_parse_pair() {
    assert_eq!(
        Attributes::parse_pair(" artifactType = classes "),
        Some(("artifactType".to_string(), "classes".to_string()))
    );
    assert_eq!(Attributes::parse_pair("=x"), None);
    assert_eq!(Attributes::parse_pair("novalue"), None);
}

#[test]
fn test_attributes_display_sorted() {
    let attrs = Attributes::new()
        .with("usage", "runtime")
        .with("artifactType", "jar");
    assert_eq!(attrs.to_string(), "{artifactType=jar, usage=runtime}");
}

// --- toolchains ---

#[test]
fn test_toolchain_query_lists_installations() {
    let registry = StaticToolchainRegistry::new(vec![
        Installation {
            name: "jdk-17".to_string(),
            path: PathBuf::from("/opt/jdk-17"),
        },
        Installation {
            name: "jdk-21".to_string(),
            path: PathBuf::from("/opt/jdk-21"),
        },
    ]);
    assert_eq!(
        ToolchainQueryService::new(registry).query(),
        "* jdk-17 (/opt/jdk-17)\n* jdk-21 (/opt/jdk-21)"
    );
}

#[test]
fn test_toolchain_query_empty() {
    let service = ToolchainQueryService::new(StaticToolchainRegistry::default());
    assert_eq!(service.query(), "");
}

// --- settings ---

const SETTINGS: &str = r#"
[settings]
workers = 3
steps = ["digest", "filter:*.blake3"]
exclude = ["*.tmp"]
verbose = true

[settings.attributes]
artifactType = "digest"

[[toolchains]]
name = "jdk-17"
path = "/opt/jdk-17"

[upstream]
app = ["/repo/core.jar"]
"#;

#[test]
fn test_settings_applied_to_opts() {
    let settings = Settings::from_toml_str(SETTINGS).unwrap();
    let mut opts = Opts::default();
    apply_settings_to_opts(&settings, &mut opts);
    assert_eq!(opts.num_workers, Some(3));
    assert_eq!(opts.steps, vec!["digest", "filter:*.blake3"]);
    assert_eq!(opts.exclude, vec!["*.tmp"]);
    assert!(opts.verbose);
    assert_eq!(opts.target_attributes.get("artifactType"), Some("digest"));
    assert_eq!(settings.toolchains.len(), 1);
    assert_eq!(
        settings.upstream.get("app"),
        Some(&vec![PathBuf::from("/repo/core.jar")])
    );
}

#[test]
fn test_load_settings_missing_and_malformed() {
    let dir = scratch("settings");
    assert!(load_settings(&dir).unwrap().is_none());

    let path = PackagePaths::get().settings_path(&dir);
    write(&path, "[settings]\nworkers = \"many\"\n");
    assert!(load_settings(&dir).is_err());

    write(&path, SETTINGS);
    let loaded = load_settings(&dir).unwrap().unwrap();
    assert!(loaded.verbose());
    let _ = fs::remove_dir_all(&dir);
}

// --- built-in steps ---

#[test]
fn test_copy_and_digest_steps() {
    let dir = scratch("steps");
    let input = dir.join("app").join("core.jar");
    write(&input, "jar bytes");
    let out = dir.join("out");
    let dirs = StepDirs::new(&dir, &out);
    let none = TransformDependencies::none();

    let copied = parse_step("copy", &dirs)
        .unwrap()
        .transform(&input, &none)
        .unwrap();
    assert_eq!(copied, vec![out.join("app").join("core.jar")]);
    assert_eq!(fs::read_to_string(&copied[0]).unwrap(), "jar bytes");

    let digested = parse_step("digest", &dirs)
        .unwrap()
        .transform(&input, &none)
        .unwrap();
    assert_eq!(digested, vec![out.join("app").join("core.jar.blake3")]);
    let expected = blake3::hash(b"jar bytes").to_hex().to_string();
    assert_eq!(
        fs::read_to_string(&digested[0]).unwrap().trim(),
        expected
    );
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_filter_step_drops_non_matching() {
    let step = parse_step("filter:*.jar", &StepDirs::new("/x", "/unused")).unwrap();
    assert_eq!(step.display_name(), "filter:*.jar");
    let none = TransformDependencies::none();
    assert_eq!(
        step.transform(Path::new("/x/a.jar"), &none).unwrap(),
        vec![PathBuf::from("/x/a.jar")]
    );
    assert!(step.transform(Path::new("/x/a.txt"), &none).unwrap().is_empty());
}

#[test]
fn test_dependency_list_step() {
    let dir = scratch("deps");
    let input = dir.join("app").join("main.jar");
    write(&input, "main");
    let step = parse_step("with-deps", &StepDirs::new(&dir, dir.join("out"))).unwrap();
    assert!(step.requires_dependencies());

    let deps = TransformDependencies::new(vec![PathBuf::from("/repo/core.jar")]);
    let produced = step.transform(&input, &deps).unwrap();
    assert_eq!(
        fs::read_to_string(&produced[0]).unwrap(),
        "/repo/core.jar\n"
    );
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_parse_step_unknown() {
    let dirs = StepDirs::new("/src", "/out");
    assert!(parse_step("unzip", &dirs).is_err());
    assert!(parse_step("filter:", &dirs).is_err());
}

#[test]
fn test_same_named_files_in_different_components_stay_apart() {
    let dir = scratch("collide");
    let from_a = dir.join("compA").join("lib").join("a.txt");
    let from_b = dir.join("compB").join("lib").join("a.txt");
    let nested = dir.join("compA").join("extra").join("lib").join("a.txt");
    write(&from_a, "from A");
    write(&from_b, "from B");
    write(&nested, "from nested");
    let out = dir.join("out");
    let step = parse_step("copy", &StepDirs::new(&dir, &out)).unwrap();
    let none = TransformDependencies::none();

    let a = step.transform(&from_a, &none).unwrap();
    let b = step.transform(&from_b, &none).unwrap();
    let n = step.transform(&nested, &none).unwrap();
    assert_eq!(a, vec![out.join("compA").join("lib").join("a.txt")]);
    assert_eq!(b, vec![out.join("compB").join("lib").join("a.txt")]);
    assert_ne!(a, n);
    assert_eq!(fs::read_to_string(&a[0]).unwrap(), "from A");
    assert_eq!(fs::read_to_string(&b[0]).unwrap(), "from B");
    assert_eq!(fs::read_to_string(&n[0]).unwrap(), "from nested");

    let digests = parse_step("digest", &StepDirs::new(&dir, &out)).unwrap();
    let da = digests.transform(&from_a, &none).unwrap();
    let db = digests.transform(&from_b, &none).unwrap();
    assert_ne!(da, db);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_chained_copy_keeps_content() {
    let dir = scratch("copy-twice");
    let input = dir.join("app").join("core.jar");
    write(&input, "jar bytes");
    let out = dir.join("out");
    let step = parse_step("copy", &StepDirs::new(&dir, &out)).unwrap();
    let none = TransformDependencies::none();

    let first = step.transform(&input, &none).unwrap();
    let second = step.transform(&first[0], &none).unwrap();
    assert_eq!(second, first);
    assert_eq!(fs::read_to_string(&second[0]).unwrap(), "jar bytes");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_step_rejects_input_outside_root() {
    let dir = scratch("outside");
    let step = parse_step("copy", &StepDirs::new(dir.join("src"), dir.join("out"))).unwrap();
    let err = step
        .transform(&dir.join("elsewhere.jar"), &TransformDependencies::none())
        .unwrap_err();
    assert!(err.to_string().contains("is outside"));
    let _ = fs::remove_dir_all(&dir);
}

// --- discovery ---

#[test]
fn test_discover_components() {
    let root = scratch("discover");
    let paths = PackagePaths::get();
    write(&root.join("top.txt"), "t");
    write(&root.join("app/main.jar"), "m");
    write(&root.join("app/lib/util.jar"), "u");
    write(&root.join("app/notes.tmp"), "x");
    write(&root.join("core/core.jar"), "c");
    write(&root.join("empty/.DS_Store"), "");
    write(&paths.settings_path(&root), "");
    let out = root.join(paths.out_dir_name());
    write(&out.join("app/main.jar"), "old output");

    let mut exclude = paths.default_exclude_patterns();
    exclude.push("*.tmp".to_string());
    let components = discover_components(&root, Some(out.as_path()), &exclude).unwrap();

    let names: Vec<_> = components
        .iter()
        .map(|(c, _)| c.as_str().to_string())
        .collect();
    let root_name = root.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(names, vec![root_name, "app".to_string(), "core".to_string()]);

    let app: Vec<_> = components[1]
        .1
        .artifacts()
        .iter()
        .map(|a| a.id.name.clone())
        .collect();
    assert_eq!(app, vec!["lib/util", "main"]);
    let first = &components[1].1.artifacts()[0];
    assert!(first.is_local());
    assert_eq!(first.attributes.get("artifactType"), Some("jar"));
    let _ = fs::remove_dir_all(&root);
}

// --- module metadata ---

#[test]
fn test_metadata_written_for_component() {
    let dir = scratch("metadata");
    let jar = dir.join("core.jar");
    write(&jar, "core");
    let publication = Publication {
        name: "maven".to_string(),
        component: Some(SoftwareComponent {
            name: "core".to_string(),
            usages: vec![UsageContext {
                name: "runtime".to_string(),
                attributes: Attributes::new().with("artifactType", "jar"),
                artifacts: vec![jar.clone()],
            }],
        }),
    };
    let target = dir.join("meta").join("core.module");
    assert!(ModuleMetadataWriter.write_to(&target, &publication).unwrap());

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(doc["formatVersion"], "1.1");
    assert_eq!(doc["component"]["publication"], "maven");
    assert_eq!(doc["variants"][0]["attributes"]["artifactType"], "jar");
    let file = &doc["variants"][0]["files"][0];
    assert_eq!(file["name"], "core.jar");
    assert_eq!(file["size"], 4);
    assert_eq!(
        file["blake3"],
        blake3::hash(b"core").to_hex().to_string()
    );
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_metadata_skipped_without_component() {
    let dir = scratch("metadata-none");
    let publication = Publication {
        name: "maven".to_string(),
        component: None,
    };
    let target = dir.join("none.module");
    assert!(!ModuleMetadataWriter.write_to(&target, &publication).unwrap());
    assert!(!target.exists());
    assert!(publication.variant_files().is_empty());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_variant_files_deduplicated_in_order() {
    let usage = |name: &str, files: &[&str]| UsageContext {
        name: name.to_string(),
        attributes: Attributes::new(),
        artifacts: files.iter().map(PathBuf::from).collect(),
    };
    let publication = Publication {
        name: "maven".to_string(),
        component: Some(SoftwareComponent {
            name: "core".to_string(),
            usages: vec![
                usage("api", &["/a.jar", "/b.jar"]),
                usage("runtime", &["/b.jar", "/c.jar"]),
            ],
        }),
    };
    assert_eq!(
        publication.variant_files(),
        vec![
            PathBuf::from("/a.jar"),
            PathBuf::from("/b.jar"),
            PathBuf::from("/c.jar")
        ]
    );
}

// --- worker limits ---

#[test]
fn test_workers_for_fd_limit() {
    assert_eq!(workers_for_fd_limit(1024), 205);
    assert_eq!(workers_for_fd_limit(3), 1);
    assert_eq!(workers_for_fd_limit(0), 1);
}

#[test]
fn test_effective_workers_clamped() {
    let limits = WorkerThreadLimits::current();
    assert_eq!(limits.effective(Some(0)), 1);
    assert!(limits.effective(Some(100_000)) <= WorkerThreadLimits::MAX_THREADS);
    assert!(limits.effective(None) >= 1);
}

#[test]
fn test_write_atomically_replaces_file() {
    let dir = scratch("atomic");
    let path = dir.join("nested").join("out.json");
    write_atomically(&path, b"first").unwrap();
    write_atomically(&path, b"second").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    assert!(!dir.join("nested").join("out.json.tmp").exists());
    let _ = fs::remove_dir_all(&dir);
}
