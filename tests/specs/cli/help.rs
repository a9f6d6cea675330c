//! Usage/version surface of the `orcha` binary (`spec.md` §6).

use crate::prelude::cli;

#[test]
fn help_lists_the_global_flags_and_subcommands() {
    cli()
        .args(["--help"])
        .passes()
        .stdout_has("--listen-address")
        .stdout_has("--port")
        .stdout_has("--key")
        .stdout_has("--max-workers")
        .stdout_has("--look-ahead-items")
        .stdout_has("serve")
        .stdout_has("run");
}

#[test]
fn version_is_reported() {
    cli().args(["--version"]).passes().stdout_has("orcha");
}

#[test]
fn serve_help_documents_its_aliases() {
    cli().args(["serve", "--help"]).passes().stdout_has("plugin");
}

#[test]
fn run_help_documents_the_id_and_extra_flags() {
    cli().args(["run", "--help"]).passes().stdout_has("--id").stdout_has("--extra");
}

#[test]
fn missing_subcommand_fails_with_usage() {
    cli().args([]).fails_with(2);
}
