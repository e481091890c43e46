/// Parser for the declaration prelude of GLSL ES 1.0 style shaders
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1},
    combinator::{map, recognize, value},
    multi::{many0, many0_count},
    sequence::{pair, preceded, tuple},
    IResult,
};

/// Storage qualifier of a top-level declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Attribute,
    Uniform,
    Varying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub qualifier: Qualifier,
    pub ty: String,
    pub name: String,
}

/// Inputs and outputs a shader declares before `main`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    pub declarations: Vec<Declaration>,
}

impl ShaderInterface {
    pub fn with_qualifier(&self, qualifier: Qualifier) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(move |d| d.qualifier == qualifier)
    }

    pub fn find(&self, qualifier: Qualifier, name: &str) -> Option<&Declaration> {
        self.with_qualifier(qualifier).find(|d| d.name == name)
    }

    /// First declared attribute; it carries the vertex positions
    pub fn position_attribute(&self) -> Option<&Declaration> {
        self.with_qualifier(Qualifier::Attribute).next()
    }

    /// First `vec3` or `vec4` attribute after the position; it carries vertex colors
    pub fn color_attribute(&self) -> Option<&Declaration> {
        self.with_qualifier(Qualifier::Attribute)
            .skip(1)
            .find(|d| d.ty == "vec3" || d.ty == "vec4")
    }

    /// First declared `mat4` uniform; it carries the object-to-clip matrix
    pub fn matrix_uniform(&self) -> Option<&Declaration> {
        self.with_qualifier(Qualifier::Uniform).find(|d| d.ty == "mat4")
    }
}

/// Parse the declarations of `source` and check that a well-formed `main` follows
pub fn parse_shader(source: &str) -> Result<ShaderInterface, String> {
    let (rest, declarations) =
        prelude(source).map_err(|e| format!("failed to parse declarations: {:?}", e))?;

    let (body, _) = main_signature(rest)
        .map_err(|_| format!("expected `void main() {{` at `{}`", snippet(rest)))?;

    match closing_brace(body) {
        Some(end) if body[end + 1..].trim().is_empty() => Ok(ShaderInterface { declarations }),
        Some(end) => Err(format!(
            "unexpected text after main: `{}`",
            snippet(&body[end + 1..])
        )),
        None => Err("unterminated main body".to_string()),
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn declaration(input: &str) -> IResult<&str, Declaration> {
    let (input, qualifier) = alt((
        value(Qualifier::Attribute, tag("attribute")),
        value(Qualifier::Uniform, tag("uniform")),
        value(Qualifier::Varying, tag("varying")),
    ))(input)?;
    let (input, ty) = preceded(multispace1, identifier)(input)?;
    let (input, name) = preceded(multispace1, identifier)(input)?;
    let (input, _) = preceded(multispace0, char(';'))(input)?;

    Ok((
        input,
        Declaration {
            qualifier,
            ty: ty.to_string(),
            name: name.to_string(),
        },
    ))
}

fn precision(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            tag("precision"),
            multispace1,
            alt((tag("lowp"), tag("mediump"), tag("highp"))),
            multispace1,
            identifier,
            multispace0,
            char(';'),
        )),
    )(input)
}

fn prelude(input: &str) -> IResult<&str, Vec<Declaration>> {
    let (input, items) = many0(preceded(
        multispace0,
        alt((map(declaration, Some), map(precision, |_| None))),
    ))(input)?;
    Ok((input, items.into_iter().flatten().collect()))
}

fn main_signature(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            multispace0,
            tag("void"),
            multispace1,
            tag("main"),
            multispace0,
            char('('),
            multispace0,
            char(')'),
            multispace0,
            char('{'),
        )),
    )(input)
}

/// Byte offset of the brace closing an already opened block
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn snippet(input: &str) -> &str {
    let input = input.trim_start();
    match input.char_indices().nth(24) {
        Some((end, _)) => &input[..end],
        None => input,
    }
}
