use super::*;

#[test]
fn no_sources() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run_expect(&mut space.incjc())?;
    assert_output_contains(&out, "No sources found.");
    Ok(())
}

#[test]
fn full_then_nothing() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    space.write("src/B.java", "class B\nuses A\n")?;

    let out = space.run_expect(&mut space.incjc())?;
    assert_output_contains(&out, "No meta information found in");
    assert_output_contains(&out, "Recompiling all sources.");
    assert_output_contains(&out, "fake javac compiled 2 files");
    assert!(space.exists("out/A.class"));
    assert!(space.exists("out/B.class"));

    let out = space.run_expect(&mut space.incjc())?;
    assert_output_contains(&out, "Nothing to compile.");
    assert_output_not_contains(&out, "fake javac");
    Ok(())
}

#[test]
fn change_recompiles_dependents() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    space.write("src/B.java", "class B\nuses A\n")?;
    space.write("src/C.java", "class C\n")?;
    space.run_expect(&mut space.incjc())?;

    space.write("src/A.java", "class A\n// edited\n")?;
    let out = space.run_expect(&mut space.incjc())?;
    let src = space.path("src").canonicalize()?;
    assert_output_contains(&out, "Sources to compile:");
    assert_output_contains(&out, &src.join("A.java").display().to_string());
    assert_output_contains(&out, &src.join("B.java").display().to_string());
    assert_output_not_contains(&out, &src.join("C.java").display().to_string());
    assert_output_contains(&out, "fake javac compiled 2 files");
    assert!(space.exists("out/C.class"));

    let out = space.run_expect(&mut space.incjc())?;
    assert_output_contains(&out, "Nothing to compile.");
    Ok(())
}

#[test]
fn deleted_source_removes_classes() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    space.write("src/B.java", "class B\n")?;
    space.run_expect(&mut space.incjc())?;

    space.remove("src/B.java")?;
    let out = space.run_expect(&mut space.incjc())?;
    assert_output_contains(&out, "Nothing to compile.");
    assert!(space.exists("out/A.class"));
    assert!(!space.exists("out/B.class"));
    Ok(())
}

#[test]
fn extra_classpath_from_env() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    std::fs::create_dir(space.path("lib"))?;
    space.write("lib/Lib.class", "source Lib.java\nclass Lib\n")?;
    space.write("src/A.java", "class A\nuses Lib\n")?;

    let out = space.run(&mut space.incjc())?;
    assert_eq!(out.status.code(), Some(1));

    space.run_expect(space.incjc().env("CLASSPATH", space.path("lib")))?;
    assert!(space.exists("out/A.class"));
    Ok(())
}

#[test]
fn debug_logging() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    space.run_expect(&mut space.incjc())?;

    let out = space.run_expect(&mut space.incjc())?;
    assert!(out.stderr.is_empty());

    let out = space.run_expect(space.incjc().env("INCJC_DEBUG", "1"))?;
    assert_stderr_contains(&out, "comparing hashes");
    Ok(())
}

#[test]
fn writes_trace() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    space.run_expect(space.incjc().env("INCJC_TRACE", space.path("trace.json")))?;
    let trace = std::fs::read_to_string(space.path("trace.json"))?;
    assert!(trace.starts_with('['));
    assert!(trace.contains("\"compile\""));
    assert!(trace.contains("\"main\""));
    Ok(())
}
