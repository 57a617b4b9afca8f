use super::*;

#[test]
fn wrong_argument_count() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(space.incjc().arg("extra"))?;
    assert_eq!(out.status.code(), Some(3));
    assert_stderr_contains(&out, "Usage: incjc <classpath> <sourcepath>");
    Ok(())
}

#[test]
fn help() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(std::process::Command::new(incjc_binary()).arg("--help"))?;
    assert_eq!(out.status.code(), Some(0));
    assert_output_contains(&out, "sourcepath");
    Ok(())
}

#[test]
fn compile_error() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\nerror\n")?;
    let out = space.run(&mut space.incjc())?;
    assert_eq!(out.status.code(), Some(1));
    assert_stderr_contains(&out, "error: bad source");

    // A failed full build records nothing, so the next one is full again.
    space.write("src/A.java", "class A\n")?;
    let out = space.run_expect(&mut space.incjc())?;
    assert_output_contains(&out, "No meta information found in");
    Ok(())
}

#[test]
fn incremental_compile_error_keeps_output() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    space.write("src/B.java", "class B\nuses A\n")?;
    space.run_expect(&mut space.incjc())?;
    let before = std::fs::read(space.path("out/B.class"))?;

    space.write("src/B.java", "class B\nuses A\nerror\n")?;
    let out = space.run(&mut space.incjc())?;
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(std::fs::read(space.path("out/B.class"))?, before);

    // The change is still pending.
    let out = space.run(&mut space.incjc())?;
    assert_eq!(out.status.code(), Some(1));
    assert_output_contains(&out, "Sources to compile:");
    Ok(())
}

#[test]
fn output_is_a_file() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    space.write("out", "not a directory")?;
    let out = space.run(&mut space.incjc())?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "incjc: error:");
    assert_stderr_contains(&out, "classpath provided is not a directory");
    Ok(())
}

#[test]
fn missing_tool() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("src/A.java", "class A\n")?;
    std::fs::remove_file(space.path("jdk/bin/jdeps"))?;
    let out = space.run(&mut space.incjc())?;
    assert_eq!(out.status.code(), Some(2));
    assert_stderr_contains(&out, "incjc: error:");
    Ok(())
}
