// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::process::Command as StdCommand;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::bail;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "x", about = "Development tasks for the cmsketch workspace")]
struct Command {
    #[command(subcommand)]
    sub: SubCommand,
}

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self.sub {
            SubCommand::Build(cmd) => cmd.run(),
            SubCommand::Lint(cmd) => cmd.run(),
            SubCommand::Test(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum SubCommand {
    #[clap(about = "Compile workspace packages.")]
    Build(CommandBuild),
    #[clap(about = "Run format and clippy checks.")]
    Lint(CommandLint),
    #[clap(about = "Run unit, integration and doc tests.")]
    Test(CommandTest),
}

#[derive(Parser)]
struct CommandBuild {
    #[arg(long, help = "Assert that `Cargo.lock` will remain unchanged.")]
    locked: bool,
}

impl CommandBuild {
    fn run(self) -> anyhow::Result<()> {
        let mut cmd = make_cargo_cmd()?;
        cmd.args(["build", "--workspace", "--all-features", "--tests", "--benches"]);
        if self.locked {
            cmd.arg("--locked");
        }
        run_command(cmd)
    }
}

#[derive(Parser)]
struct CommandLint {
    #[arg(long, help = "Automatically apply lint suggestions.")]
    fix: bool,
}

impl CommandLint {
    fn run(self) -> anyhow::Result<()> {
        let mut fmt = make_cargo_cmd()?;
        fmt.args(["fmt", "--all"]);
        if !self.fix {
            fmt.arg("--check");
        }
        run_command(fmt)?;

        let mut clippy = make_cargo_cmd()?;
        clippy.args(["clippy", "--workspace", "--all-targets", "--all-features"]);
        if self.fix {
            clippy.args(["--fix", "--allow-dirty", "--allow-staged"]);
        }
        clippy.args(["--", "-D", "warnings"]);
        run_command(clippy)
    }
}

#[derive(Parser)]
struct CommandTest {
    #[arg(long, help = "Run tests serially and do not capture output.")]
    no_capture: bool,
}

impl CommandTest {
    fn run(self) -> anyhow::Result<()> {
        let mut cmd = make_cargo_cmd()?;
        cmd.args(["test", "--workspace", "--all-features"]);
        if self.no_capture {
            cmd.args(["--", "--nocapture", "--test-threads=1"]);
        }
        run_command(cmd)
    }
}

fn make_cargo_cmd() -> anyhow::Result<StdCommand> {
    let cargo = which::which("cargo").context("cannot find cargo")?;
    Ok(StdCommand::new(cargo))
}

fn run_command(mut cmd: StdCommand) -> anyhow::Result<()> {
    eprintln!("running {cmd:?}");
    let status = cmd
        .status()
        .with_context(|| format!("failed to spawn {cmd:?}"))?;
    if !status.success() {
        bail!("{cmd:?} exited with {status}");
    }
    Ok(())
}

fn main() -> ExitCode {
    match Command::parse().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
