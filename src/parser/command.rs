// Command parser for the interactive surface

use super::lexer::{column_ref, count_literal, identifier, string_literal, ws};
use crate::chart::{Backend, Bindings, ChartKind, Role};
use crate::filter::FilterCriterion;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{eof, map, map_res, opt, value},
    multi::{separated_list0, separated_list1},
    sequence::{pair, preceded},
    IResult,
};

/// One instruction typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    /// `filter(column: c, value: "s")`; `filter()` clears the filter
    Filter(Option<FilterCriterion>),
    /// `plot(kind: bar, x: c, y: c)`; bindings not given are kept
    Plot { kind: ChartKind, bindings: Bindings },
    /// `bind(y: c)`
    Bind(Bindings),
    Backend(Backend),
    Head(usize),
    Describe,
    Columns,
    Insight,
    Save(String),
    Export,
    Quit,
}

/// Call shape shared by every command: `name(args)`.
fn call<'a, O, F>(name: &'static str, args: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    let mut args = args;
    move |input: &'a str| -> IResult<&'a str, O> {
        let (input, _) = ws(tag(name))(input)?;
        let (input, _) = ws(char('('))(input)?;
        let (input, out) = args(input)?;
        let (input, _) = ws(char(')'))(input)?;
        Ok((input, out))
    }
}

fn no_args(input: &str) -> IResult<&str, ()> {
    Ok((input, ()))
}

fn role(input: &str) -> IResult<&str, Role> {
    alt((
        value(Role::X, tag("x:")),
        value(Role::Y, tag("y:")),
        value(Role::Size, tag("size:")),
        value(Role::Category, tag("category:")),
        value(Role::Value, tag("value:")),
    ))(input)
}

/// `role: column`
fn binding(input: &str) -> IResult<&str, (Role, String)> {
    pair(ws(role), ws(column_ref))(input)
}

fn to_bindings(pairs: Vec<(Role, String)>) -> Bindings {
    pairs
        .into_iter()
        .fold(Bindings::default(), |b, (role, column)| b.with(role, column))
}

fn chart_kind(input: &str) -> IResult<&str, ChartKind> {
    map_res(identifier, |name| name.parse::<ChartKind>())(input)
}

/// Parse a filter command
/// Format: filter(column: region, value: "east") or filter()
pub fn parse_filter(input: &str) -> IResult<&str, SurfaceCommand> {
    let criterion = opt(map(
        pair(
            preceded(ws(tag("column:")), ws(column_ref)),
            preceded(ws(char(',')), preceded(ws(tag("value:")), ws(string_literal))),
        ),
        |(column, substring)| FilterCriterion::new(column, substring),
    ));
    map(call("filter", criterion), SurfaceCommand::Filter)(input)
}

/// Parse a plot command
/// Format: plot(kind: bar) or plot(kind: bubble, x: a, y: b, size: c)
pub fn parse_plot(input: &str) -> IResult<&str, SurfaceCommand> {
    let args = pair(
        preceded(ws(tag("kind:")), ws(chart_kind)),
        map(opt(preceded(ws(char(',')), separated_list1(ws(char(',')), binding))), |pairs| {
            to_bindings(pairs.unwrap_or_default())
        }),
    );
    map(call("plot", args), |(kind, bindings)| SurfaceCommand::Plot { kind, bindings })(input)
}

/// Parse a bind command
/// Format: bind(y: cost) or bind(category: region, value: sales)
pub fn parse_bind(input: &str) -> IResult<&str, SurfaceCommand> {
    let args = map(separated_list1(ws(char(',')), binding), to_bindings);
    map(call("bind", args), SurfaceCommand::Bind)(input)
}

/// Parse a backend command
/// Format: backend(static) or backend(interactive)
pub fn parse_backend(input: &str) -> IResult<&str, SurfaceCommand> {
    let args = map_res(ws(identifier), |name| name.parse::<Backend>());
    map(call("backend", args), SurfaceCommand::Backend)(input)
}

/// Parse a head command
/// Format: head(5); head() shows five rows
pub fn parse_head(input: &str) -> IResult<&str, SurfaceCommand> {
    let args = map(opt(ws(count_literal)), |n| n.unwrap_or(5));
    map(call("head", args), SurfaceCommand::Head)(input)
}

/// Parse a save command
/// Format: save(path: "chart.png")
pub fn parse_save(input: &str) -> IResult<&str, SurfaceCommand> {
    let args = preceded(ws(tag("path:")), ws(string_literal));
    map(call("save", args), SurfaceCommand::Save)(input)
}

fn parse_bare(input: &str) -> IResult<&str, SurfaceCommand> {
    alt((
        map(call("describe", no_args), |_| SurfaceCommand::Describe),
        map(call("columns", no_args), |_| SurfaceCommand::Columns),
        map(call("insight", no_args), |_| SurfaceCommand::Insight),
        map(call("export", no_args), |_| SurfaceCommand::Export),
        map(call("quit", no_args), |_| SurfaceCommand::Quit),
    ))(input)
}

pub fn parse_command(input: &str) -> IResult<&str, SurfaceCommand> {
    alt((
        parse_filter,
        parse_plot,
        parse_bind,
        parse_backend,
        parse_head,
        parse_save,
        parse_bare,
    ))(input)
}

/// Parse one input line
/// Format: command | command | ...
pub fn parse_commands(input: &str) -> IResult<&str, Vec<SurfaceCommand>> {
    let (input, commands) = separated_list0(ws(tag("|")), parse_command)(input)?;
    let (input, _) = ws(eof)(input)?;
    Ok((input, commands))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        let (_, cmd) = parse_command(r#"filter(column: region, value: "east")"#).unwrap();
        assert_eq!(cmd, SurfaceCommand::Filter(Some(FilterCriterion::new("region", "east"))));
    }

    #[test]
    fn test_parse_filter_clear() {
        let (_, cmd) = parse_command("filter( )").unwrap();
        assert_eq!(cmd, SurfaceCommand::Filter(None));
    }

    #[test]
    fn test_parse_filter_missing_value() {
        // A column without a value is neither a filter nor a clear
        assert!(parse_commands("filter(column: region)").is_err());
    }

    #[test]
    fn test_parse_plot_with_bindings() {
        let (_, cmd) = parse_command("plot(kind: bubble, x: cost, y: sales, size: cost)").unwrap();
        let SurfaceCommand::Plot { kind, bindings } = cmd else {
            panic!("expected plot");
        };
        assert_eq!(kind, ChartKind::Bubble);
        assert_eq!(bindings.x.as_deref(), Some("cost"));
        assert_eq!(bindings.size.as_deref(), Some("cost"));
        assert_eq!(bindings.category, None);
    }

    #[test]
    fn test_parse_plot_kind_only() {
        let (_, cmd) = parse_command("plot(kind: pie)").unwrap();
        assert_eq!(cmd, SurfaceCommand::Plot { kind: ChartKind::Pie, bindings: Bindings::default() });
    }

    #[test]
    fn test_parse_plot_unknown_kind() {
        assert!(parse_command("plot(kind: radar)").is_err());
    }

    #[test]
    fn test_parse_bind_quoted_column() {
        let (_, cmd) = parse_command(r#"bind(y: "unit price")"#).unwrap();
        assert_eq!(cmd, SurfaceCommand::Bind(Bindings::default().with(Role::Y, "unit price")));
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_command("backend(static)").unwrap().1, SurfaceCommand::Backend(Backend::Static));
        assert!(parse_command("backend(opengl)").is_err());
    }

    #[test]
    fn test_parse_head() {
        assert_eq!(parse_command("head(3)").unwrap().1, SurfaceCommand::Head(3));
        assert_eq!(parse_command("head()").unwrap().1, SurfaceCommand::Head(5));
    }

    #[test]
    fn test_parse_save() {
        assert_eq!(
            parse_command(r#"save(path: "out.png")"#).unwrap().1,
            SurfaceCommand::Save("out.png".to_string())
        );
    }

    #[test]
    fn test_parse_chain() {
        let (rest, cmds) =
            parse_commands(r#"filter(column: region, value: "east") | plot(kind: bar, x: region, y: sales) | export()"#)
                .unwrap();
        assert_eq!(rest, "");
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[2], SurfaceCommand::Export);
    }

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(parse_commands("   ").unwrap().1, vec![]);
    }

    #[test]
    fn test_parse_trailing_pipe() {
        assert!(parse_commands("describe() |").is_err());
    }

    #[test]
    fn test_parse_garbage_after_command() {
        assert!(parse_commands("columns() columns()").is_err());
    }
}
