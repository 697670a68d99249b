//! Terminal front-end: renders the catalog table, asks for purchase
//! confirmation and runs the interactive shell.

use std::io::{BufRead, Write};

use rust_decimal::Decimal;

use storefront_core::ProductId;
use storefront_infra::CatalogStore;
use storefront_products::Product;

use crate::error::AppError;
use crate::session::{Confirm, PurchaseOutcome, Storefront};

const HEADERS: [&str; 4] = ["ID", "Product Name", "Price (Rs.)", "Stock"];

pub fn format_price(price: Decimal) -> String {
    format!("{price:.2}")
}

/// Render the catalog as an aligned text table.
///
/// The selected row (if any) is marked with `>`.
pub fn render_catalog(products: &[Product], selected: Option<ProductId>) -> String {
    let rows: Vec<[String; 4]> = products
        .iter()
        .map(|p| {
            [
                p.id().to_string(),
                p.name().to_string(),
                format_price(p.price()),
                p.stock().to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, "  ", &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str("  ");
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for (product, row) in products.iter().zip(&rows) {
        let marker = if Some(product.id()) == selected { "> " } else { "  " };
        push_row(&mut out, marker, row, &widths);
    }

    if products.is_empty() {
        out.push_str("  (no products)\n");
    }

    out
}

fn push_row(out: &mut String, marker: &str, cells: &[String; 4], widths: &[usize; 4]) {
    out.push_str(marker);
    // ID, price and stock are right-aligned; the name is left-aligned.
    let line = format!(
        "{:>w0$} | {:<w1$} | {:>w2$} | {:>w3$}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    );
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Line-oriented prompt over any reader/writer pair (stdin/stdout in the binary).
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Print `prompt` and read one line; `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn confirm_purchase(&mut self, product: &Product) -> bool {
        let question = format!(
            "Do you want to buy {} for Rs. {}? [y/N] ",
            product.name(),
            format_price(product.price())
        );
        match self.read_line(&question) {
            Ok(Some(answer)) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read confirmation");
                false
            }
        }
    }
}

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Select(ProductId),
    Buy(Option<ProductId>),
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ShellCommand::Empty);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for `{verb}`"));
    }

    let id = |arg: Option<&str>| -> Result<Option<ProductId>, String> {
        arg.map(|a| a.parse::<ProductId>().map_err(|e| e.to_string()))
            .transpose()
    };

    match (verb.to_ascii_lowercase().as_str(), arg) {
        ("list" | "ls" | "refresh", None) => Ok(ShellCommand::List),
        ("select" | "sel", Some(_)) => Ok(ShellCommand::Select(id(arg)?.ok_or("missing id")?)),
        ("select" | "sel", None) => Err("usage: select <id>".to_string()),
        ("buy", _) => Ok(ShellCommand::Buy(id(arg)?)),
        ("help" | "?", None) => Ok(ShellCommand::Help),
        ("quit" | "exit" | "q", None) => Ok(ShellCommand::Quit),
        (other, _) => Err(format!("unknown command `{other}` (try `help`)")),
    }
}

const HELP: &str = "\
Commands:
  list            reload and show the catalog
  select <id>     select a product
  buy [id]        buy one unit of the selected (or given) product
  help            show this help
  quit            leave
";

/// Write the user-facing lines for a purchase attempt.
pub fn report_purchase(
    out: &mut impl Write,
    result: &Result<PurchaseOutcome, AppError>,
) -> std::io::Result<()> {
    match result {
        Ok(PurchaseOutcome::Purchased {
            product,
            refresh_error,
        }) => {
            writeln!(out, "Successfully purchased {}!", product.name())?;
            if let Some(err) = refresh_error {
                writeln!(out, "[{}] Error retrieving products: {err}", err.title())?;
            }
        }
        Ok(PurchaseOutcome::Cancelled) => writeln!(out, "Purchase cancelled.")?,
        Err(err) if err.is_validation() => writeln!(out, "[{}] {err}", err.title())?,
        Err(err) => writeln!(out, "[{}] Error processing purchase: {err}", err.title())?,
    }
    Ok(())
}

/// Run the interactive shell until `quit` or end of input.
pub async fn run_shell<S, R, W>(
    storefront: &mut Storefront<S>,
    prompt: &mut TerminalPrompt<R, W>,
) -> std::io::Result<()>
where
    S: CatalogStore,
    R: BufRead,
    W: Write,
{
    show_catalog(storefront, prompt.output()).await?;

    while let Some(line) = prompt.read_line("storefront> ")? {
        match parse_command(&line) {
            Ok(ShellCommand::Empty) => {}
            Ok(ShellCommand::Quit) => break,
            Ok(ShellCommand::Help) => write!(prompt.output(), "{HELP}")?,
            Ok(ShellCommand::List) => show_catalog(storefront, prompt.output()).await?,
            Ok(ShellCommand::Select(id)) => match storefront.select(id) {
                Ok(product) => {
                    let line = format!(
                        "Selected {} (Rs. {}, {} in stock).",
                        product.name(),
                        format_price(product.price()),
                        product.stock()
                    );
                    writeln!(prompt.output(), "{line}")?;
                }
                Err(err) => writeln!(prompt.output(), "[{}] {err}", err.title())?,
            },
            Ok(ShellCommand::Buy(id)) => {
                let result = match id {
                    Some(id) => storefront.buy(id, prompt).await,
                    None => storefront.buy_selected(prompt).await,
                };
                report_purchase(prompt.output(), &result)?;
                if matches!(result, Ok(PurchaseOutcome::Purchased { .. })) {
                    let table = render_catalog(storefront.snapshot(), selected_id(storefront));
                    write!(prompt.output(), "{table}")?;
                }
            }
            Err(msg) => writeln!(prompt.output(), "{msg}")?,
        }
    }

    Ok(())
}

/// Refresh and print the catalog; on failure print the error and the last good snapshot.
pub async fn show_catalog<S, W>(storefront: &mut Storefront<S>, out: &mut W) -> std::io::Result<()>
where
    S: CatalogStore,
    W: Write,
{
    if let Err(err) = storefront.refresh().await {
        writeln!(out, "[{}] Error retrieving products: {err}", err.title())?;
    }
    let table = render_catalog(storefront.snapshot(), selected_id(storefront));
    write!(out, "{table}")
}

fn selected_id<S: CatalogStore>(storefront: &Storefront<S>) -> Option<ProductId> {
    storefront.selected().map(Product::id)
}
