//! Textual type descriptors used by declaration documents.
//!
//! ```text
//! int | bool | str | float | <ShapeName>
//! list[T] | set[T] | dict[K, V] | tuple[T, ...] | optional[T] | enum[a, 'b c']
//! ```
//!
//! Constructor names are case-insensitive (`List[int]` works too). Parsing
//! yields an unresolved [`Descriptor`]; shape names are looked up later by the
//! registry, which needs the references first to order and cycle-check its
//! declarations.
use crate::error::SchemaError;
use crate::ir::{Primitive, Ty};
use crate::shape::ShapeType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// A primitive or a shape name.
    Named(String),
    List(Box<Descriptor>),
    Set(Box<Descriptor>),
    Dict(Box<Descriptor>, Box<Descriptor>),
    Tuple(Vec<Descriptor>),
    Optional(Box<Descriptor>),
    Enum(Vec<String>),
}

impl Descriptor {
    pub fn parse(src: &str) -> Result<Self, SchemaError> {
        let mut parser = Parser { src, pos: 0 };
        let out = parser.descriptor()?;
        parser.skip_ws();
        if parser.pos != src.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(out)
    }

    /// Names that are not primitives, i.e. shape references, in order of
    /// appearance.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Descriptor::Named(name) if Primitive::from_label(name).is_none() => out.push(name),
            Descriptor::Named(_) | Descriptor::Enum(_) => {}
            Descriptor::List(d) | Descriptor::Set(d) | Descriptor::Optional(d) => {
                d.collect_references(out)
            }
            Descriptor::Dict(k, v) => {
                k.collect_references(out);
                v.collect_references(out);
            }
            Descriptor::Tuple(ds) => {
                for d in ds {
                    d.collect_references(out);
                }
            }
        }
    }

    /// Turn into a [`Ty`], looking shape names up with `lookup`.
    pub fn resolve<F>(&self, lookup: &F) -> Result<Ty, SchemaError>
    where
        F: Fn(&str) -> Option<ShapeType>,
    {
        Ok(match self {
            Descriptor::Named(name) => match Primitive::from_label(name) {
                Some(p) => Ty::Primitive(p),
                None => match lookup(name) {
                    Some(shape) => Ty::Shape(shape),
                    None => return Err(SchemaError::UnknownType(name.clone())),
                },
            },
            Descriptor::List(d) => Ty::list(d.resolve(lookup)?),
            Descriptor::Set(d) => Ty::set(d.resolve(lookup)?),
            Descriptor::Dict(k, v) => Ty::dict(k.resolve(lookup)?, v.resolve(lookup)?)?,
            Descriptor::Tuple(ds) => {
                Ty::tuple(ds.iter().map(|d| d.resolve(lookup)).collect::<Result<Vec<_>, _>>()?)?
            }
            Descriptor::Optional(d) => Ty::optional(d.resolve(lookup)?),
            Descriptor::Enum(variants) => Ty::enumeration(variants.iter().cloned())?,
        })
    }
}

impl std::str::FromStr for Descriptor {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Descriptor::parse(s)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::MalformedDescriptor {
            descriptor: self.src.to_string(),
            reason: format!("{} at offset {}", reason.into(), self.pos),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SchemaError> {
        if self.eat(c) { Ok(()) } else { Err(self.error(format!("expected `{c}`"))) }
    }

    fn ident(&mut self) -> Result<&'a str, SchemaError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn descriptor(&mut self) -> Result<Descriptor, SchemaError> {
        let name = self.ident()?;
        if !self.eat('[') {
            return match name.to_ascii_lowercase().as_str() {
                "list" | "set" | "dict" | "tuple" | "optional" | "enum" => {
                    Err(self.error(format!("`{name}` needs type arguments")))
                }
                _ => Ok(Descriptor::Named(name.to_string())),
            };
        }
        let out = match name.to_ascii_lowercase().as_str() {
            "list" => Descriptor::List(Box::new(self.descriptor()?)),
            "set" => Descriptor::Set(Box::new(self.descriptor()?)),
            "optional" => Descriptor::Optional(Box::new(self.descriptor()?)),
            "dict" => {
                let key = self.descriptor()?;
                self.expect(',')?;
                let value = self.descriptor()?;
                Descriptor::Dict(Box::new(key), Box::new(value))
            }
            "tuple" => {
                let mut elems = vec![self.descriptor()?];
                while self.eat(',') {
                    elems.push(self.descriptor()?);
                }
                Descriptor::Tuple(elems)
            }
            "enum" => {
                let mut variants = vec![self.variant()?];
                while self.eat(',') {
                    variants.push(self.variant()?);
                }
                Descriptor::Enum(variants)
            }
            _ => return Err(SchemaError::UnknownType(name.to_string())),
        };
        self.expect(']')?;
        Ok(out)
    }

    fn variant(&mut self) -> Result<String, SchemaError> {
        self.skip_ws();
        let Some(quote) = self.rest().chars().next().filter(|c| *c == '\'' || *c == '"') else {
            return self.ident().map(str::to_string);
        };
        self.pos += 1;
        let rest = self.rest();
        let Some(end) = rest.find(quote) else {
            return Err(self.error("unterminated string"));
        };
        self.pos += end + 1;
        Ok(rest[..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(s: &str) -> Descriptor {
        Descriptor::Named(s.to_string())
    }

    #[test]
    fn parses_primitives_and_names() {
        assert_eq!(Descriptor::parse("int").unwrap(), named("int"));
        assert_eq!(Descriptor::parse("  Point ").unwrap(), named("Point"));
    }

    #[test]
    fn parses_nested_constructors() {
        let d = Descriptor::parse("dict[str, List[tuple[int, Point]]]").unwrap();
        assert_eq!(
            d,
            Descriptor::Dict(
                Box::new(named("str")),
                Box::new(Descriptor::List(Box::new(Descriptor::Tuple(vec![
                    named("int"),
                    named("Point"),
                ])))),
            )
        );
        assert_eq!(d.references(), ["Point"]);
    }

    #[test]
    fn parses_enum_variants() {
        let d = Descriptor::parse("enum[rpm, 'tar ball', \"x\"]").unwrap();
        assert_eq!(d, Descriptor::Enum(vec!["rpm".into(), "tar ball".into(), "x".into()]));
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in ["", "list[int", "list", "dict[str]", "int]", "enum['a]", "list[]"] {
            assert!(
                matches!(Descriptor::parse(bad), Err(SchemaError::MalformedDescriptor { .. })),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn unknown_constructor_is_an_unknown_type() {
        assert_eq!(
            Descriptor::parse("frozenset[int]").unwrap_err(),
            SchemaError::UnknownType("frozenset".into())
        );
    }

    #[test]
    fn resolve_reports_unknown_names() {
        let d = Descriptor::parse("list[Nope]").unwrap();
        assert_eq!(d.resolve(&|_| None).unwrap_err(), SchemaError::UnknownType("Nope".into()));
    }

    #[test]
    fn resolve_rejects_collection_dict_keys() {
        let d = Descriptor::parse("dict[list[int], str]").unwrap();
        assert_eq!(
            d.resolve(&|_| None).unwrap_err(),
            SchemaError::NonPrimitiveDictKey("List[int]".into())
        );
    }

    #[test]
    fn resolve_builds_types() {
        let point = ShapeType::new([("x", Ty::INT)]).unwrap();
        let d = Descriptor::parse("optional[set[Point]]").unwrap();
        let ty = d
            .resolve(&|name| (name == "Point").then(|| point.clone()))
            .unwrap();
        assert_eq!(ty.label(), format!("Optional[Set[{}]]", point.identity()));
    }
}
