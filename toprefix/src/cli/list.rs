// toprefix/src/cli/list.rs
use clap::Args;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use toprefix_common::config::Config;
use toprefix_common::error::Result;
use toprefix_core::catalog::Catalog;

#[derive(Args, Debug)]
pub struct List {}

impl List {
    pub fn run(&self, config: &Config) -> Result<()> {
        let catalog = Catalog::load(config)?;

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Name").style_spec("b"),
            Cell::new("Version").style_spec("b"),
            Cell::new("Backend").style_spec("b"),
            Cell::new("Origin").style_spec("b"),
        ]));
        for package in catalog.packages() {
            table.add_row(Row::new(vec![
                Cell::new(package.name()).style_spec("Fb"),
                Cell::new(package.version()),
                Cell::new(package.backend.label()).style_spec("Fg"),
                Cell::new(package.source.url()),
            ]));
        }
        table.printstd();
        println!("{}", format!("{} packages", catalog.packages().len()).bold());
        Ok(())
    }
}
