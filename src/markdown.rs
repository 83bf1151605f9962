use anyhow::anyhow;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Tag};
use std::{ops::Range, str::FromStr};
use tera::Tera;
use url::Url;

use combine::{
    between,
    parser::{
        char::{spaces, string as Str},
        range::take_while,
        repeat::SepBy,
    },
    sep_by, EasyParser, Parser, Stream,
};

use crate::{
    highlighter::Highlighter,
    page::{ContentFormat, PartialPage},
    Config,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    name: String,
    value: String,
}

/// A `{{ name(arg="value", ...) }}` call embedded in page content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortCode {
    name: String,
    arguments: Vec<Argument>,
}

impl ShortCode {
    fn template_name(&self) -> String {
        format!("shortcodes/{}.html", self.name)
    }
}

pub fn lit<I>(l: &'static str) -> impl Parser<I, Output = String>
where
    I: Stream<Token = char>,
{
    Str(l).map(|s| s.to_string()).skip(spaces())
}

fn parse_shortcode(input: &str) -> anyhow::Result<ShortCode> {
    let ident = || take_while(|c: char| c.is_alphanumeric() || c == '_').skip(spaces());
    let literal_str = between(lit("\""), lit("\""), take_while(|c: char| c != '\"')).skip(spaces());
    let arg = (ident(), lit("="), literal_str).map(|t: (&str, String, &str)| Argument {
        name: t.0.to_string(),
        value: t.2.to_string(),
    });
    let arg_list: SepBy<Vec<_>, _, _> = sep_by(arg, lit(","));
    let args = between(lit("("), lit(")"), arg_list);

    let mut call = between(
        lit("{{"),
        lit("}}"),
        (ident(), args).map(|t: (&str, _)| ShortCode {
            name: t.0.to_string(),
            arguments: t.1,
        }),
    );

    let result = call
        .easy_parse(input)
        .map_err(|e| e.map_range(|r| format!("{:?}", r)))
        .map_err(|e| e.map_position(|p| p.translate_position(input)))?;

    if result.0.name.is_empty() {
        return Err(anyhow!("shortcode without a name: {input}"));
    }

    Ok(result.0)
}

/// Renders Markdown with highlighted fenced code. With `base`, relative
/// image paths are made absolute against it.
pub fn markdown_to_html(
    input: &str,
    highlighter: &Highlighter,
    base: Option<&Url>,
) -> anyhow::Result<String> {
    let mut events = vec![];

    let mut in_code_block = false;
    let mut lang = String::new();
    let mut code = String::new();

    for event in pulldown_cmark::Parser::new(input) {
        match event {
            Event::Start(Tag::Image(link_type, mut dest_url, title)) => {
                if let Some(base) = base.filter(|_| Url::from_str(&dest_url).is_err()) {
                    dest_url = base.join(&dest_url)?.to_string().into();
                }
                events.push(Event::Start(Tag::Image(link_type, dest_url, title)));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                lang = if let CodeBlockKind::Fenced(name) = kind {
                    name.to_string()
                } else {
                    "".to_string()
                };
            }
            Event::Text(t) if in_code_block => {
                code.push_str(&t);
            }
            Event::End(Tag::CodeBlock(_)) if in_code_block => {
                let result = highlighter.highlight(&lang, &code)?;

                events.push(Event::Html(CowStr::from(result)));

                in_code_block = false;
                code = String::new();
            }
            _ => events.push(event),
        }
    }

    let mut contents = String::new();
    html::push_html(&mut contents, events.into_iter());

    Ok(contents)
}

/// Turns page bodies into markup: shortcode expansion for every format,
/// Markdown with highlighted code blocks for `.md` content.
pub struct Renderer<'a> {
    pub config: &'a Config,
    pub tera: &'a Tera,
    pub highlighter: &'a Highlighter,
}

impl<'a> Renderer<'a> {
    pub fn render_shortcode(&self, input: &str, page: &PartialPage) -> anyhow::Result<String> {
        let shortcode = parse_shortcode(input)?;
        let template = shortcode.template_name();

        if !self.tera.get_template_names().any(|t| t == template) {
            return Err(anyhow!("unknown shortcode '{}'", shortcode.name));
        }

        let mut ctx = tera::Context::new();

        for arg in &shortcode.arguments {
            ctx.insert(&arg.name, &arg.value);
        }

        ctx.insert("config", self.config);
        ctx.insert("page", page);

        Ok(self.tera.render(&template, &ctx)?.trim_end().to_string())
    }

    pub fn render_markdown(&self, input: &str, page: &PartialPage) -> anyhow::Result<String> {
        markdown_to_html(input, self.highlighter, Some(&page.permalink))
    }

    pub fn render_content(
        &self,
        input: &str,
        format: ContentFormat,
        page: &PartialPage,
    ) -> anyhow::Result<String> {
        let mut output = input.to_string();

        for range in content_ranges(input)?.into_iter().rev() {
            match range {
                ContentRange::Text(r) => {
                    if format == ContentFormat::Markdown {
                        let rendered = self.render_markdown(&input[r.clone()], page)?;
                        output.replace_range(r, &rendered);
                    }
                }
                ContentRange::ShortCode(r) => {
                    let rendered = self.render_shortcode(&input[r.clone()], page)?;
                    output.replace_range(r, &rendered);
                }
            }
        }

        Ok(output)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ContentRange {
    Text(Range<usize>),
    ShortCode(Range<usize>),
}

fn content_ranges(input: &str) -> anyhow::Result<Vec<ContentRange>> {
    let mut ranges = vec![];

    let mut last = 0;
    while let Some(start) = input[last..].find("{{") {
        if start > 0 {
            ranges.push(ContentRange::Text(last..last + start));
        }

        if let Some(end) = input[last + start..].find("}}") {
            ranges.push(ContentRange::ShortCode(
                last + start..last + start + end + 2,
            ));
            last = last + start + end + 2;
        } else {
            return Err(anyhow!("unterminated shortcode"));
        }
    }

    if last < input.len() {
        ranges.push(ContentRange::Text(last..input.len()))
    }

    Ok(ranges)
}
