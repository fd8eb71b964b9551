use super::error::TreeError;
use super::node::NodeId;
use super::tree::Tree;
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while},
    character::complete::{char, digit1, multispace0},
    combinator::{cut, map, map_res, opt, recognize},
    error::{context, ContextError, ErrorKind, FromExternalError, ParseError},
    multi::{many1, separated_list1},
    sequence::{delimited, preceded},
    IResult, Offset, Parser,
};
use std::collections::BTreeMap;

type Props = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq)]
enum Frame {
    Context(&'static str),
    Nom(ErrorKind),
}

/// nom error that keeps every context frame so failures can be reported
/// with line/column and the stack of constructs being parsed.
#[derive(Clone, Debug, PartialEq)]
struct NewickError<'a> {
    frames: Vec<(&'a str, Frame)>,
}

impl<'a> ParseError<&'a str> for NewickError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        NewickError {
            frames: vec![(input, Frame::Nom(kind))],
        }
    }

    fn append(input: &'a str, kind: ErrorKind, mut other: Self) -> Self {
        other.frames.push((input, Frame::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a str> for NewickError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.frames.push((input, Frame::Context(ctx)));
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for NewickError<'a> {
    fn from_external_error(input: &'a str, kind: ErrorKind, _e: E) -> Self {
        Self::from_error_kind(input, kind)
    }
}

type PResult<'a, O> = IResult<&'a str, O, NewickError<'a>>;

/// Recursive parse result, flattened into the arena afterwards.
#[derive(Debug, Default)]
struct Subtree {
    name: Option<String>,
    length: Option<f64>,
    properties: Option<Props>,
    children: Vec<Subtree>,
}

impl Subtree {
    fn into_arena(self, tree: &mut Tree) -> NodeId {
        let id = tree.add_node();
        for child in self.children {
            let child_id = child.into_arena(tree);
            tree.nodes[child_id].parent = Some(id);
            tree.nodes[id].children.push(child_id);
        }
        let node = &mut tree.nodes[id];
        node.name = self.name;
        node.length = self.length;
        node.properties = self.properties;
        id
    }

    fn into_tree(self) -> Tree {
        let mut tree = Tree::new();
        let root = self.into_arena(&mut tree);
        tree.set_root(root);
        tree
    }
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

// Unquoted labels stop at Newick punctuation; quoted ones may hold anything
// but their own quote character.
fn label(input: &str) -> PResult<'_, String> {
    let unquoted = map(take_while(|c: char| !"():;,[]".contains(c)), |s: &str| {
        s.trim().to_string()
    });
    let single_quoted = delimited(char('\''), map(is_not("'"), str::to_string), char('\''));
    let double_quoted = delimited(char('"'), map(is_not("\""), str::to_string), char('"'));

    context("label", alt((single_quoted, double_quoted, unquoted))).parse(input)
}

fn length(input: &str) -> PResult<'_, f64> {
    let number = recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            digit1,
        )),
    ));

    context(
        "length",
        preceded(ws(char(':')), cut(map_res(number, |s: &str| s.parse::<f64>()))),
    )
    .parse(input)
}

/// `[&&NHX:k=v:...]` or `[k=v k=v]`; other comments are dropped.
fn comment(input: &str) -> PResult<'_, Option<Props>> {
    let body = delimited(ws(char('[')), is_not("]"), char(']'));

    context(
        "comment",
        map(opt(body), |content: Option<&str>| {
            let text = content?;
            let props: Props = match text.strip_prefix("&&NHX") {
                Some(nhx) => nhx
                    .split(':')
                    .filter_map(|part| part.split_once('='))
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                None => text
                    .split_whitespace()
                    .filter_map(|part| part.split_once('='))
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            (!props.is_empty()).then_some(props)
        }),
    )
    .parse(input)
}

// (child,child,...)label:length[comment]
fn subtree(input: &str) -> PResult<'_, Subtree> {
    let (input, children) = context(
        "children",
        opt(delimited(
            ws(char('(')),
            separated_list1(ws(char(',')), subtree),
            ws(char(')')),
        )),
    )
    .parse(input)?;

    let (input, name) = opt(label).parse(input)?;
    let (input, before) = comment(input)?;
    let (input, length) = opt(length).parse(input)?;
    let (input, after) = comment(input)?;

    let properties = match (before, after) {
        (None, None) => None,
        (a, b) => Some(a.into_iter().chain(b).flatten().collect()),
    };

    Ok((
        input,
        Subtree {
            name: name.filter(|l| !l.is_empty()),
            length,
            properties,
            children: children.unwrap_or_default(),
        },
    ))
}

/// Parse a single tree terminated by `;`.
pub fn parse_newick(input: &str) -> Result<Tree, TreeError> {
    match (ws(subtree), ws(char(';'))).parse(input) {
        Ok((_, (root, _))) => Ok(root.into_tree()),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(to_tree_error(input, e)),
        Err(nom::Err::Incomplete(_)) => Err(incomplete()),
    }
}

/// Parse every tree in the input, skipping top-level `[...]` blocks.
pub fn parse_newick_multi(input: &str) -> Result<Vec<Tree>, TreeError> {
    let tree = map((ws(subtree), ws(char(';'))), |(root, _)| Some(root));
    let skipped = map(
        ws(delimited(char('['), take_while(|c| c != ']'), char(']'))),
        |_| None,
    );

    match many1(alt((tree, skipped))).parse(input) {
        Ok((_, roots)) => Ok(roots.into_iter().flatten().map(Subtree::into_tree).collect()),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(to_tree_error(input, e)),
        Err(nom::Err::Incomplete(_)) => Err(incomplete()),
    }
}

fn incomplete() -> TreeError {
    TreeError::ParseError {
        message: "Incomplete input".to_string(),
        line: 0,
        column: 0,
        snippet: String::new(),
    }
}

fn to_tree_error(input: &str, e: NewickError) -> TreeError {
    let remaining = e.frames.first().map(|(rest, _)| *rest).unwrap_or(input);
    let offset = input.offset(remaining);

    let prefix = &input[..offset];
    let line = prefix.matches('\n').count() + 1;
    let column = offset - prefix.rfind('\n').map(|p| p + 1).unwrap_or(0) + 1;

    let message = e
        .frames
        .iter()
        .rev()
        .map(|(_, frame)| match frame {
            Frame::Context(ctx) => format!("while parsing {}:\n", ctx),
            Frame::Nom(kind) => format!("  error: {:?}\n", kind),
        })
        .collect();

    TreeError::ParseError {
        message,
        line,
        column,
        snippet: remaining.chars().take(50).collect(),
    }
}

impl Tree {
    /// Parse a Newick string into a Tree.
    ///
    /// ```
    /// use colphy::libs::phylo::Tree;
    ///
    /// let tree = Tree::from_newick("(human.chr1|10,chimp.chr1|12)Anc0;").unwrap();
    /// assert_eq!(tree.len(), 3);
    /// assert!(Tree::from_newick("(A,B:x)C;").is_err());
    /// ```
    pub fn from_newick(input: &str) -> Result<Self, TreeError> {
        parse_newick(input)
    }

    pub fn from_newick_multi(input: &str) -> Result<Vec<Self>, TreeError> {
        parse_newick_multi(input)
    }
}
