//! Line-oriented reader for Quake-style brush map files.
//!
//! The format is brace-structured text. Top level is a sequence of
//! entities; inside an entity, lines are either `"key" "value"` properties
//! or nested brush blocks; inside a brush, each line defines one supporting
//! plane:
//!
//! ```text
//! ( x1 y1 z1 ) ( x2 y2 z2 ) ( x3 y3 z3 ) TEXNAME [ tx ty tz tw ] [ bx by bz bw ] ...
//! ```
//!
//! The three points define the plane; the bracketed 4-vectors carry the
//! texture tangent frame (the fourth component is discarded). Anything
//! after the second bracket group is ignored.

use std::fs;
use std::path::Path;

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::error::Error;
use crate::plane::{MapPlane, Plane};

/// A parsed map file: a sequence of entities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapFile {
    pub entities: Vec<Entity>,
}

/// One map entity: key/value properties plus the supporting-plane sets of
/// its brushes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    properties: Vec<(String, String)>,
    brushes: Vec<Vec<MapPlane>>,
}

impl Entity {
    /// Looks up a property value by key.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns all properties in file order.
    #[inline]
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Returns the plane sets of the entity's brushes, in file order.
    #[inline]
    pub fn brushes(&self) -> &[Vec<MapPlane>] {
        &self.brushes
    }
}

/// Reads and parses a map file from disk.
pub fn load_map(path: impl AsRef<Path>) -> Result<MapFile, Error> {
    let text = fs::read_to_string(path)?;
    parse_map(&text)
}

/// Parses map text into entities.
pub fn parse_map(text: &str) -> Result<MapFile, Error> {
    #[derive(PartialEq)]
    enum State {
        TopLevel,
        Entity,
        Brush,
    }

    let mut state = State::TopLevel;
    let mut map = MapFile::default();
    let mut entity = Entity::default();
    let mut brush: Vec<MapPlane> = Vec::new();
    let mut last_line = 0;

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        last_line = line_number;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        match state {
            State::TopLevel => match line {
                "{" => {
                    entity = Entity::default();
                    state = State::Entity;
                }
                _ => {
                    return Err(Error::parse(
                        line_number,
                        format!("expected '{{' to open an entity, found {line:?}"),
                    ));
                }
            },
            State::Entity => match line {
                "{" => {
                    brush = Vec::new();
                    state = State::Brush;
                }
                "}" => {
                    map.entities.push(std::mem::take(&mut entity));
                    state = State::TopLevel;
                }
                _ if line.starts_with('"') => {
                    entity.properties.push(parse_property(line, line_number)?);
                }
                _ => {
                    return Err(Error::parse(
                        line_number,
                        format!("expected a property or brush, found {line:?}"),
                    ));
                }
            },
            State::Brush => match line {
                "}" => {
                    entity.brushes.push(std::mem::take(&mut brush));
                    state = State::Entity;
                }
                _ => {
                    brush.push(parse_plane_line(line, line_number)?);
                }
            },
        }
    }

    if state != State::TopLevel {
        return Err(Error::parse(last_line, "unexpected end of file inside a block"));
    }

    debug!(
        "parsed map: {} entities, {} brushes",
        map.entities.len(),
        map.entities.iter().map(|e| e.brushes.len()).sum::<usize>()
    );
    Ok(map)
}

fn parse_property(line: &str, line_number: usize) -> Result<(String, String), Error> {
    let quotes: Vec<usize> = line.match_indices('"').map(|(i, _)| i).collect();
    if quotes.len() != 4 {
        return Err(Error::parse(
            line_number,
            format!("expected \"key\" \"value\", found {line:?}"),
        ));
    }
    let key = &line[quotes[0] + 1..quotes[1]];
    let value = &line[quotes[2] + 1..quotes[3]];
    Ok((key.to_string(), value.to_string()))
}

/// Token cursor over one plane line.
struct Tokens<'a> {
    tokens: Vec<&'a str>,
    position: usize,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str, line_number: usize) -> Self {
        Self {
            tokens: line.split_whitespace().collect(),
            position: 0,
            line: line_number,
        }
    }

    fn next(&mut self) -> Result<&'a str, Error> {
        let token = self
            .tokens
            .get(self.position)
            .copied()
            .ok_or_else(|| Error::parse(self.line, "plane line ends too early"))?;
        self.position += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &str) -> Result<(), Error> {
        let token = self.next()?;
        if token != expected {
            return Err(Error::parse(
                self.line,
                format!("expected {expected:?}, found {token:?}"),
            ));
        }
        Ok(())
    }

    fn number(&mut self) -> Result<f64, Error> {
        let token = self.next()?;
        token
            .parse::<f64>()
            .map_err(|_| Error::parse(self.line, format!("bad number {token:?}")))
    }

    /// Parses `( x y z )` into a point.
    fn point(&mut self) -> Result<Point3<f64>, Error> {
        self.expect("(")?;
        let x = self.number()?;
        let y = self.number()?;
        let z = self.number()?;
        self.expect(")")?;
        Ok(Point3::new(x, y, z))
    }

    /// Parses `[ x y z w ]`, discarding the fourth component.
    fn axis(&mut self) -> Result<Vector3<f64>, Error> {
        self.expect("[")?;
        let x = self.number()?;
        let y = self.number()?;
        let z = self.number()?;
        let _w = self.number()?;
        self.expect("]")?;
        Ok(Vector3::new(x, y, z))
    }
}

fn parse_plane_line(line: &str, line_number: usize) -> Result<MapPlane, Error> {
    let mut tokens = Tokens::new(line, line_number);

    let p1 = tokens.point()?;
    let p2 = tokens.point()?;
    let p3 = tokens.point()?;
    let _texture = tokens.next()?;
    let tangent = tokens.axis()?;
    let bitangent = tokens.axis()?;
    // Trailing tokens (offsets, rotation, scale) are ignored.

    let plane = Plane::from_points(p1, p2, p3)
        .ok_or_else(|| Error::parse(line_number, "plane points are collinear"))?;
    Ok(MapPlane::new(plane, tangent, bitangent))
}
