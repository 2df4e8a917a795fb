use std::path::PathBuf;

use clap::{Args, Subcommand};
use corpusprep_labels::SymbolTable;
use serde::Serialize;

use super::output_result;
use crate::Cli;

/// Symbol table inspection.
#[derive(Args)]
pub struct VocabCommand {
    #[command(subcommand)]
    command: VocabSubcommand,
}

#[derive(Subcommand)]
enum VocabSubcommand {
    /// Print every symbol with its index
    Show {
        /// Table file (`symbol  index` lines)
        table: PathBuf,
    },
}

#[derive(Serialize)]
struct TableListing<'a> {
    size: usize,
    symbols: &'a [String],
}

impl VocabCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            VocabSubcommand::Show { table } => {
                let table = SymbolTable::load(table)?;
                if cli.json {
                    return output_result(
                        cli,
                        &TableListing {
                            size: table.len(),
                            symbols: table.symbols(),
                        },
                    );
                }
                print!("{}", table.to_text());
                Ok(())
            }
        }
    }
}
