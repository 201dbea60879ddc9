use std::{fs, path::PathBuf, process::exit};

use clap::{Parser, Subcommand};
use sstub_diff::{lang_profile::LangProfile, options::DiffOptions, tree::AstNode};
use typed_arena::Arena;

/// Dev helper for contributing to sstub-diff
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
    /// Override automatic language detection.
    #[arg(short = 'L', long, global = true)]
    language: Option<String>,
}

#[derive(Subcommand, Debug)]
#[deny(missing_docs)]
enum Command {
    /// Print the parsed tree for a file, for debugging purposes
    Parse {
        /// Path to the file to parse. Its type will be guessed from its extension.
        path: PathBuf,
    },
    /// Localize the smallest differing subtree pair between two files and print it
    Diff {
        /// Path to the source file
        source: PathBuf,
        /// Path to the target file
        target: PathBuf,
        /// Widen the localized pair to its enclosing statement before printing
        #[arg(short, long)]
        statement: bool,
    },
    /// Print the Chawathe edit script turning `source` into `target`
    EditScript {
        /// Path to the source file
        source: PathBuf,
        /// Path to the target file
        target: PathBuf,
    },
    /// Classify the single-statement change between two Python files as an SStuB pattern
    Sstub {
        /// Path to the source file
        source: PathBuf,
        /// Path to the target file
        target: PathBuf,
    },
    /// List the languages this crate knows how to parse
    Languages {
        /// Print in `.gitattributes` `diff=` format instead of a human-readable listing
        #[arg(short, long)]
        gitattributes: bool,
    },
}

fn main() {
    stderrlog::new().module(module_path!()).init().unwrap();

    match real_main(&CliArgs::parse()) {
        Ok(exit_code) => exit(exit_code),
        Err(error) => {
            eprintln!("diff_dev: {error}");
            exit(-1)
        }
    }
}

fn real_main(args: &CliArgs) -> Result<i32, String> {
    let arena = Arena::new();
    let ref_arena = Arena::new();

    let lang_for = |path: &PathBuf| -> Result<LangProfile, String> {
        LangProfile::find_by_filename_or_name(&path.to_string_lossy(), args.language.as_deref())
    };

    let read = |path: &PathBuf| -> Result<String, String> {
        fs::read_to_string(path).map_err(|err| format!("Could not read {}: {err}", path.display()))
    };

    let exit_code = match &args.command {
        Command::Parse { path } => {
            let lang = lang_for(path)?;
            let contents = read(path)?;
            let tree = sstub_diff::parse(&contents, &lang, &arena, &ref_arena)
                .map_err(|err| format!("File has parse errors: {err}"))?;
            print!("{}", ascii_tree(tree, 0));
            0
        }
        Command::Diff { source, target, statement } => {
            let lang = lang_for(source)?;
            let source_contents = read(source)?;
            let target_contents = read(target)?;
            let source_ast = sstub_diff::parse(&source_contents, &lang, &arena, &ref_arena)
                .map_err(|err| format!("Source has parse errors: {err}"))?;
            let target_ast = sstub_diff::parse(&target_contents, &lang, &arena, &ref_arena)
                .map_err(|err| format!("Target has parse errors: {err}"))?;

            let diff = sstub_diff::difference(source_ast, target_ast, DiffOptions::default())
                .map_err(|err| err.to_string())?;
            let diff = if *statement { diff.statement_diff().map_err(|err| err.to_string())? } else { diff };

            println!("source: {} ({})", diff.source_ast.grammar_name, diff.source_text());
            println!("target: {} ({})", diff.target_ast.grammar_name, diff.target_text());
            0
        }
        Command::EditScript { source, target } => {
            let lang = lang_for(source)?;
            let source_contents = read(source)?;
            let target_contents = read(target)?;
            let source_ast = sstub_diff::parse(&source_contents, &lang, &arena, &ref_arena)
                .map_err(|err| format!("Source has parse errors: {err}"))?;
            let target_ast = sstub_diff::parse(&target_contents, &lang, &arena, &ref_arena)
                .map_err(|err| format!("Target has parse errors: {err}"))?;

            let diff = sstub_diff::difference(source_ast, target_ast, DiffOptions::default())
                .map_err(|err| err.to_string())?;
            let script = diff.edit_script();
            if script.is_ghost() {
                eprintln!("diff_dev: localized pair produced a ghost script, widen with --statement");
            }
            print!("{}", script.serialize());
            println!();
            0
        }
        Command::Sstub { source, target } => {
            let source_contents = read(source)?;
            let target_contents = read(target)?;
            let python = LangProfile::find_by_filename_or_name("a.py", args.language.as_deref())?;
            let source_ast = sstub_diff::parse(&source_contents, &python, &arena, &ref_arena)
                .map_err(|err| format!("Source has parse errors: {err}"))?;
            let target_ast = sstub_diff::parse(&target_contents, &python, &arena, &ref_arena)
                .map_err(|err| format!("Target has parse errors: {err}"))?;

            let diff = sstub_diff::difference(source_ast, target_ast, DiffOptions::default())
                .map_err(|err| err.to_string())?;
            let pattern = diff.sstub_pattern().map_err(|err| err.to_string())?;
            println!("{pattern:?}");
            0
        }
        Command::Languages { gitattributes } => {
            print!("{}", sstub_diff::languages(*gitattributes));
            0
        }
    };
    Ok(exit_code)
}

fn ascii_tree(node: &AstNode, depth: usize) -> String {
    let mut out = format!("{}{} [{}:{}]\n", "  ".repeat(depth), node.grammar_name, node.start_point.0, node.start_point.1);
    for child in &node.children {
        out.push_str(&ascii_tree(child, depth + 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }

    #[test]
    fn languages_command_runs() {
        assert_eq!(
            real_main(&CliArgs::parse_from(["diff_dev", "languages"])),
            Ok(0)
        );
    }
}
