//! Hand tracking graph topology as a structured value.
//!
//! The topology can be rendered to and parsed from the text-proto form that
//! graph engines traditionally consume. Only the subset needed to describe a
//! graph of streams and option-carrying nodes is understood.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_MIN_DETECTION_CONFIDENCE, DEFAULT_MIN_TRACKING_CONFIDENCE, DEFAULT_NUM_HANDS,
    HANDEDNESS_STREAM, HAND_TRACKING_CALCULATOR, HAND_TRACKING_OPTIONS_TYPE, INPUT_STREAM,
    LANDMARKS_STREAM,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphConfigError {
    #[error("line {line}: unexpected {found}, expected {expected}")]
    UnexpectedToken {
        line: usize,
        found: String,
        expected: &'static str,
    },
    #[error("line {line}: unterminated {what}")]
    Unterminated { line: usize, what: &'static str },
    #[error("line {line}: unknown field '{field}' in {scope}")]
    UnknownField {
        line: usize,
        field: String,
        scope: &'static str,
    },
    #[error("line {line}: invalid value '{value}' for {field}")]
    InvalidNumber {
        line: usize,
        field: String,
        value: String,
    },
    #[error("unsupported node options type '{0}'")]
    UnsupportedOptions(String),
    #[error("graph has no {0}")]
    Missing(&'static str),
    #[error("stream '{0}' is produced more than once")]
    DuplicateProducer(String),
    #[error("node {calculator} reads stream '{stream}' which nothing produces")]
    UnconnectedInput { calculator: String, stream: String },
    #[error("graph output stream '{0}' is not produced by any node")]
    UnproducedOutput(String),
    #[error("num_hands must be at least 1")]
    InvalidNumHands,
    #[error("{name} must be within [0, 1], got {value}")]
    ConfidenceOutOfRange { name: &'static str, value: f32 },
}

/// Options of the hand landmark tracking node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandTrackingOptions {
    /// Maximum number of hands tracked at once.
    pub num_hands: u32,
    /// Minimum palm detection score for a new hand to be picked up.
    pub min_detection_confidence: f32,
    /// Minimum landmark presence for a hand to keep being tracked without
    /// re-running palm detection.
    pub min_tracking_confidence: f32,
}

impl Default for HandTrackingOptions {
    fn default() -> Self {
        Self {
            num_hands: DEFAULT_NUM_HANDS,
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
        }
    }
}

impl HandTrackingOptions {
    pub fn validate(&self) -> Result<(), GraphConfigError> {
        if self.num_hands < 1 {
            return Err(GraphConfigError::InvalidNumHands);
        }
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GraphConfigError::ConfidenceOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// A node stream reference, `TAG:name` or bare `name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamRef {
    pub tag: Option<String>,
    pub name: String,
}

impl StreamRef {
    pub fn tagged(tag: &str, name: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            name: name.to_string(),
        }
    }

    fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((tag, name)) => Self::tagged(tag, name),
            None => Self {
                tag: None,
                name: text.to_string(),
            },
        }
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{tag}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeConfig {
    pub calculator: String,
    pub input_streams: Vec<StreamRef>,
    pub output_streams: Vec<StreamRef>,
    pub options: Option<HandTrackingOptions>,
}

impl NodeConfig {
    /// Name of the output stream carrying `tag`, if any.
    pub fn output_for_tag(&self, tag: &str) -> Option<&str> {
        self.output_streams
            .iter()
            .find(|s| s.tag.as_deref() == Some(tag))
            .map(|s| s.name.as_str())
    }

    /// Name of the input stream carrying `tag`, if any.
    pub fn input_for_tag(&self, tag: &str) -> Option<&str> {
        self.input_streams
            .iter()
            .find(|s| s.tag.as_deref() == Some(tag))
            .map(|s| s.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphConfig {
    pub input_streams: Vec<String>,
    pub output_streams: Vec<String>,
    pub nodes: Vec<NodeConfig>,
}

impl GraphConfig {
    /// The fixed hand tracking topology with default options.
    pub fn hand_tracking() -> Self {
        Self::hand_tracking_with(HandTrackingOptions::default())
    }

    /// The hand tracking topology with custom node options.
    pub fn hand_tracking_with(options: HandTrackingOptions) -> Self {
        Self {
            input_streams: vec![INPUT_STREAM.to_string()],
            output_streams: vec![LANDMARKS_STREAM.to_string(), HANDEDNESS_STREAM.to_string()],
            nodes: vec![NodeConfig {
                calculator: HAND_TRACKING_CALCULATOR.to_string(),
                input_streams: vec![StreamRef::tagged("IMAGE", INPUT_STREAM)],
                output_streams: vec![
                    StreamRef::tagged("LANDMARKS", LANDMARKS_STREAM),
                    StreamRef::tagged("HANDEDNESS", HANDEDNESS_STREAM),
                ],
                options: Some(options),
            }],
        }
    }

    pub fn parse(text: &str) -> Result<Self, GraphConfigError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let fields = parser.message(false)?;
        build_graph(&fields)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn hand_tracking_node(&self) -> Option<&NodeConfig> {
        self.nodes
            .iter()
            .find(|n| n.calculator == HAND_TRACKING_CALCULATOR)
    }

    /// Options of the hand tracking node, defaults when unset.
    pub fn hand_tracking_options(&self) -> HandTrackingOptions {
        self.hand_tracking_node()
            .and_then(|n| n.options)
            .unwrap_or_default()
    }

    /// Checks stream wiring and node options.
    pub fn validate(&self) -> Result<(), GraphConfigError> {
        if self.input_streams.is_empty() {
            return Err(GraphConfigError::Missing("input stream"));
        }
        let node = self
            .hand_tracking_node()
            .ok_or(GraphConfigError::Missing("HandLandmarkTrackingCpu node"))?;

        let mut produced: HashSet<&str> = HashSet::new();
        for name in &self.input_streams {
            if !produced.insert(name) {
                return Err(GraphConfigError::DuplicateProducer(name.clone()));
            }
        }
        for n in &self.nodes {
            for s in &n.output_streams {
                if !produced.insert(&s.name) {
                    return Err(GraphConfigError::DuplicateProducer(s.name.clone()));
                }
            }
        }
        for n in &self.nodes {
            for s in &n.input_streams {
                if !produced.contains(s.name.as_str()) {
                    return Err(GraphConfigError::UnconnectedInput {
                        calculator: n.calculator.clone(),
                        stream: s.name.clone(),
                    });
                }
            }
        }
        for name in &self.output_streams {
            let from_node = self
                .nodes
                .iter()
                .any(|n| n.output_streams.iter().any(|s| &s.name == name));
            if !from_node {
                return Err(GraphConfigError::UnproducedOutput(name.clone()));
            }
        }

        node.options.unwrap_or_default().validate()
    }
}

impl FromStr for GraphConfig {
    type Err = GraphConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.input_streams {
            writeln!(f, "input_stream: {}", quote(s))?;
        }
        for s in &self.output_streams {
            writeln!(f, "output_stream: {}", quote(s))?;
        }
        for node in &self.nodes {
            writeln!(f)?;
            writeln!(f, "node {{")?;
            writeln!(f, "  calculator: {}", quote(&node.calculator))?;
            for s in &node.input_streams {
                writeln!(f, "  input_stream: {}", quote(&s.to_string()))?;
            }
            for s in &node.output_streams {
                writeln!(f, "  output_stream: {}", quote(&s.to_string()))?;
            }
            if let Some(o) = &node.options {
                writeln!(f, "  node_options: {{")?;
                writeln!(f, "    [{HAND_TRACKING_OPTIONS_TYPE}] {{")?;
                writeln!(f, "      num_hands: {}", o.num_hands)?;
                writeln!(f, "      min_detection_confidence: {}", o.min_detection_confidence)?;
                writeln!(f, "      min_tracking_confidence: {}", o.min_tracking_confidence)?;
                writeln!(f, "    }}")?;
                writeln!(f, "  }}")?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    TypeUrl(String),
    Colon,
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{s}'"),
            Token::Str(s) => write!(f, "string \"{s}\""),
            Token::Number(s) => write!(f, "number {s}"),
            Token::TypeUrl(s) => write!(f, "extension [{s}]"),
            Token::Colon => f.write_str("':'"),
            Token::Open => f.write_str("'{'"),
            Token::Close => f.write_str("'}'"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, GraphConfigError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() || c == ',' || c == ';' => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ':' => {
                tokens.push((Token::Colon, line));
                i += 1;
            }
            '{' => {
                tokens.push((Token::Open, line));
                i += 1;
            }
            '}' => {
                tokens.push((Token::Close, line));
                i += 1;
            }
            '"' | '\'' => {
                let start_line = line;
                let mut value = String::new();
                i += 1;
                loop {
                    let Some(&ch) = chars.get(i) else {
                        return Err(GraphConfigError::Unterminated {
                            line: start_line,
                            what: "string",
                        });
                    };
                    i += 1;
                    if ch == c {
                        break;
                    }
                    match ch {
                        '\\' => {
                            let escaped = chars.get(i).copied().ok_or(
                                GraphConfigError::Unterminated {
                                    line: start_line,
                                    what: "string",
                                },
                            )?;
                            i += 1;
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                        }
                        '\n' => {
                            return Err(GraphConfigError::Unterminated {
                                line: start_line,
                                what: "string",
                            })
                        }
                        other => value.push(other),
                    }
                }
                tokens.push((Token::Str(value), start_line));
            }
            '[' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| ch == ']' || ch == '\n')
                    .map(|p| start + p)
                    .filter(|&p| chars[p] == ']')
                    .ok_or(GraphConfigError::Unterminated {
                        line,
                        what: "extension name",
                    })?;
                let url: String = chars[start..end].iter().collect();
                tokens.push((Token::TypeUrl(url.trim().to_string()), line));
                i = end + 1;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push((Token::Ident(chars[start..i].iter().collect()), line));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '.' | '-' | '+'))
                {
                    i += 1;
                }
                tokens.push((Token::Number(chars[start..i].iter().collect()), line));
            }
            other => {
                return Err(GraphConfigError::UnexpectedToken {
                    line,
                    found: format!("character '{other}'"),
                    expected: "a field",
                })
            }
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Field {
    name: String,
    line: usize,
    value: FieldValue,
}

#[derive(Debug)]
enum FieldValue {
    Scalar(Token),
    Message(Vec<Field>),
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<(Token, usize)> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|(_, l)| *l).unwrap_or(1)
    }

    fn message(&mut self, nested: bool) -> Result<Vec<Field>, GraphConfigError> {
        let mut fields = Vec::new();
        loop {
            let (token, line) = match self.next() {
                Some(t) => t,
                None if nested => {
                    return Err(GraphConfigError::Unterminated {
                        line: self.last_line(),
                        what: "message",
                    })
                }
                None => return Ok(fields),
            };

            let name = match token {
                Token::Close if nested => return Ok(fields),
                Token::Ident(name) => name,
                Token::TypeUrl(url) => format!("[{url}]"),
                other => {
                    return Err(GraphConfigError::UnexpectedToken {
                        line,
                        found: other.to_string(),
                        expected: "a field name",
                    })
                }
            };

            let had_colon = self.peek() == Some(&Token::Colon);
            if had_colon {
                self.pos += 1;
            }

            let value = match self.next() {
                Some((Token::Open, _)) => FieldValue::Message(self.message(true)?),
                Some((tok @ (Token::Str(_) | Token::Number(_) | Token::Ident(_)), _))
                    if had_colon =>
                {
                    FieldValue::Scalar(tok)
                }
                Some((other, line)) => {
                    return Err(GraphConfigError::UnexpectedToken {
                        line,
                        found: other.to_string(),
                        expected: "a value",
                    })
                }
                None => {
                    return Err(GraphConfigError::Unterminated {
                        line,
                        what: "field",
                    })
                }
            };

            fields.push(Field { name, line, value });
        }
    }
}

fn build_graph(fields: &[Field]) -> Result<GraphConfig, GraphConfigError> {
    let mut config = GraphConfig {
        input_streams: Vec::new(),
        output_streams: Vec::new(),
        nodes: Vec::new(),
    };
    for field in fields {
        match field.name.as_str() {
            "input_stream" => config.input_streams.push(expect_string(field)?),
            "output_stream" => config.output_streams.push(expect_string(field)?),
            "node" => config.nodes.push(build_node(expect_message(field)?)?),
            other => {
                return Err(GraphConfigError::UnknownField {
                    line: field.line,
                    field: other.to_string(),
                    scope: "graph",
                })
            }
        }
    }
    Ok(config)
}

fn build_node(fields: &[Field]) -> Result<NodeConfig, GraphConfigError> {
    let mut node = NodeConfig {
        calculator: String::new(),
        input_streams: Vec::new(),
        output_streams: Vec::new(),
        options: None,
    };
    for field in fields {
        match field.name.as_str() {
            "calculator" => node.calculator = expect_string(field)?,
            "input_stream" => node
                .input_streams
                .push(StreamRef::parse(&expect_string(field)?)),
            "output_stream" => node
                .output_streams
                .push(StreamRef::parse(&expect_string(field)?)),
            "node_options" => {
                for ext in expect_message(field)? {
                    let url = ext.name.trim_start_matches('[').trim_end_matches(']');
                    if url != HAND_TRACKING_OPTIONS_TYPE {
                        return Err(GraphConfigError::UnsupportedOptions(url.to_string()));
                    }
                    node.options = Some(build_options(expect_message(ext)?)?);
                }
            }
            other => {
                return Err(GraphConfigError::UnknownField {
                    line: field.line,
                    field: other.to_string(),
                    scope: "node",
                })
            }
        }
    }
    if node.calculator.is_empty() {
        return Err(GraphConfigError::Missing("calculator on node"));
    }
    Ok(node)
}

fn build_options(fields: &[Field]) -> Result<HandTrackingOptions, GraphConfigError> {
    let mut options = HandTrackingOptions::default();
    for field in fields {
        match field.name.as_str() {
            "num_hands" => options.num_hands = expect_number(field)?,
            "min_detection_confidence" => options.min_detection_confidence = expect_number(field)?,
            "min_tracking_confidence" => options.min_tracking_confidence = expect_number(field)?,
            other => {
                return Err(GraphConfigError::UnknownField {
                    line: field.line,
                    field: other.to_string(),
                    scope: "node options",
                })
            }
        }
    }
    Ok(options)
}

fn expect_string(field: &Field) -> Result<String, GraphConfigError> {
    match &field.value {
        FieldValue::Scalar(Token::Str(s)) => Ok(s.clone()),
        FieldValue::Scalar(other) => Err(GraphConfigError::UnexpectedToken {
            line: field.line,
            found: other.to_string(),
            expected: "a string",
        }),
        FieldValue::Message(_) => Err(GraphConfigError::UnexpectedToken {
            line: field.line,
            found: "'{'".to_string(),
            expected: "a string",
        }),
    }
}

fn expect_number<T: FromStr>(field: &Field) -> Result<T, GraphConfigError> {
    match &field.value {
        FieldValue::Scalar(Token::Number(n)) => {
            n.parse().map_err(|_| GraphConfigError::InvalidNumber {
                line: field.line,
                field: field.name.clone(),
                value: n.clone(),
            })
        }
        FieldValue::Scalar(other) => Err(GraphConfigError::InvalidNumber {
            line: field.line,
            field: field.name.clone(),
            value: other.to_string(),
        }),
        FieldValue::Message(_) => Err(GraphConfigError::UnexpectedToken {
            line: field.line,
            found: "'{'".to_string(),
            expected: "a number",
        }),
    }
}

fn expect_message(field: &Field) -> Result<&[Field], GraphConfigError> {
    match &field.value {
        FieldValue::Message(fields) => Ok(fields),
        FieldValue::Scalar(other) => Err(GraphConfigError::UnexpectedToken {
            line: field.line,
            found: other.to_string(),
            expected: "'{'",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const HAND_TRACKING_TEXT: &str = r#"
  input_stream: "input_video"
  output_stream: "hand_landmarks"
  output_stream: "handedness"

  node {
    calculator: "HandLandmarkTrackingCpu"
    input_stream: "IMAGE:input_video"
    output_stream: "LANDMARKS:hand_landmarks"
    output_stream: "HANDEDNESS:handedness"
    node_options: {
      [type.googleapis.com/mediapipe.HandLandmarkTrackingCpuOptions] {
        num_hands: 2
        min_detection_confidence: 0.5
        min_tracking_confidence: 0.5
      }
    }
  }
"#;

    #[test]
    fn test_hand_tracking_topology() {
        let config = GraphConfig::hand_tracking();
        assert_eq!(config.input_streams, vec!["input_video"]);
        assert_eq!(config.output_streams, vec!["hand_landmarks", "handedness"]);
        let node = config.hand_tracking_node().unwrap();
        assert_eq!(node.input_for_tag("IMAGE"), Some("input_video"));
        assert_eq!(node.output_for_tag("LANDMARKS"), Some("hand_landmarks"));
        assert_eq!(node.output_for_tag("HANDEDNESS"), Some("handedness"));

        let options = config.hand_tracking_options();
        assert_eq!(options.num_hands, 2);
        assert_relative_eq!(options.min_detection_confidence, 0.5);
        assert_relative_eq!(options.min_tracking_confidence, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_text_matches_builtin_topology() {
        let parsed = GraphConfig::parse(HAND_TRACKING_TEXT).unwrap();
        assert_eq!(parsed, GraphConfig::hand_tracking());
    }

    #[test]
    fn test_rendered_text_parses_back() {
        let options = HandTrackingOptions {
            num_hands: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.25,
        };
        let config = GraphConfig::hand_tracking_with(options);
        let reparsed: GraphConfig = config.to_text().parse().unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_parse_skips_comments_and_separators() {
        let text = r#"
            # the only input
            input_stream: "input_video";
            output_stream: "hand_landmarks",
            node { calculator: "HandLandmarkTrackingCpu" input_stream: "IMAGE:input_video" output_stream: "LANDMARKS:hand_landmarks" }
        "#;
        let config = GraphConfig::parse(text).unwrap();
        assert_eq!(config.hand_tracking_options(), HandTrackingOptions::default());
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::unknown_top_level("bogus: 1", "unknown field 'bogus' in graph")]
    #[case::unknown_node_field(
        "node { calculator: \"X\" weight: 3 }",
        "unknown field 'weight' in node"
    )]
    #[case::unterminated_string("input_stream: \"input_video", "unterminated string")]
    #[case::unterminated_message("node { calculator: \"X\"", "unterminated message")]
    #[case::number_for_string("input_stream: 5", "expected a string")]
    #[case::stray_close("}", "expected a field name")]
    #[case::bad_character("input_stream: @", "character '@'")]
    fn test_parse_errors(#[case] text: &str, #[case] message: &str) {
        let err = GraphConfig::parse(text).unwrap_err();
        assert!(
            err.to_string().contains(message),
            "'{err}' does not mention '{message}'"
        );
    }

    #[test]
    fn test_parse_reports_line_of_error() {
        let text = "input_stream: \"a\"\n\nmystery: 1\n";
        let err = GraphConfig::parse(text).unwrap_err();
        assert_eq!(
            err,
            GraphConfigError::UnknownField {
                line: 3,
                field: "mystery".into(),
                scope: "graph"
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_number() {
        let text = HAND_TRACKING_TEXT.replace("num_hands: 2", "num_hands: two");
        let err = GraphConfig::parse(&text).unwrap_err();
        assert!(matches!(err, GraphConfigError::InvalidNumber { ref field, .. } if field == "num_hands"));
    }

    #[test]
    fn test_parse_rejects_foreign_options_type() {
        let text = HAND_TRACKING_TEXT.replace(
            "mediapipe.HandLandmarkTrackingCpuOptions",
            "mediapipe.FaceMeshOptions",
        );
        let err = GraphConfig::parse(&text).unwrap_err();
        assert_eq!(
            err,
            GraphConfigError::UnsupportedOptions("type.googleapis.com/mediapipe.FaceMeshOptions".into())
        );
    }

    #[test]
    fn test_validate_requires_hand_tracking_node() {
        let mut config = GraphConfig::hand_tracking();
        config.nodes[0].calculator = "PassThroughCalculator".into();
        assert_eq!(
            config.validate().unwrap_err(),
            GraphConfigError::Missing("HandLandmarkTrackingCpu node")
        );
    }

    #[test]
    fn test_validate_detects_unproduced_output() {
        let mut config = GraphConfig::hand_tracking();
        config.output_streams.push("palm_detections".into());
        assert_eq!(
            config.validate().unwrap_err(),
            GraphConfigError::UnproducedOutput("palm_detections".into())
        );
    }

    #[test]
    fn test_validate_detects_unconnected_input() {
        let mut config = GraphConfig::hand_tracking();
        config.nodes[0].input_streams[0] = StreamRef::tagged("IMAGE", "camera");
        assert!(matches!(
            config.validate().unwrap_err(),
            GraphConfigError::UnconnectedInput { ref stream, .. } if stream == "camera"
        ));
    }

    #[test]
    fn test_validate_detects_duplicate_producer() {
        let mut config = GraphConfig::hand_tracking();
        config.nodes[0].output_streams[1].name = "hand_landmarks".into();
        assert_eq!(
            config.validate().unwrap_err(),
            GraphConfigError::DuplicateProducer("hand_landmarks".into())
        );
    }

    #[rstest]
    #[case::zero_hands(0, 0.5, 0.5)]
    #[case::detection_above_one(2, 1.5, 0.5)]
    #[case::tracking_negative(2, 0.5, -0.1)]
    fn test_validate_rejects_bad_options(
        #[case] num_hands: u32,
        #[case] min_detection_confidence: f32,
        #[case] min_tracking_confidence: f32,
    ) {
        let config = GraphConfig::hand_tracking_with(HandTrackingOptions {
            num_hands,
            min_detection_confidence,
            min_tracking_confidence,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stream_ref_display() {
        assert_eq!(StreamRef::tagged("IMAGE", "in").to_string(), "IMAGE:in");
        assert_eq!(StreamRef::parse("plain").to_string(), "plain");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
