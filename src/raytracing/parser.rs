use std::fmt;

use super::{
    camera::CameraSettings,
    core::{Light, Scene},
    sphere::Sphere,
    Rgb, Vec3,
};

/// Recursion depth used when the file does not say `iterations`.
pub const DEFAULT_ITERATIONS: u32 = 5;

pub struct SceneParser<'a> {
    content: &'a str,
    buffer: String,
    position: FilePosition,
}

#[derive(Debug, Clone, Copy)]
struct FilePosition {
    line: u32,
    column: u32,
    index: u32,
}

impl FilePosition {
    fn new() -> Self {
        FilePosition {
            line: 0,
            column: 0,
            index: 0,
        }
    }

    fn on_new_line(self: &mut Self) {
        self.line += 1;
        self.column = 0;
        self.index += 1;
    }

    fn advance(self: &mut Self) {
        self.column += 1;
        self.index += 1;
    }
}

#[derive(Debug)]
pub struct ParserError {
    position: FilePosition,
    pub message: String,
}

impl ParserError {
    fn new(message: &str, position: FilePosition) -> ParserError {
        ParserError {
            position,
            message: message.to_string(),
        }
    }

    /// The offending line with a caret under the error column.
    pub fn error_location(self: &Self, content: &str) -> String {
        match content.lines().nth(self.position.line as usize) {
            Some(line) => {
                let spacing = " ".repeat(self.position.column as usize);
                format!("{}\n{}\n{}^", self, line, spacing)
            }
            None => self.to_string(),
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.message, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for ParserError {}

type ParserResult<T> = Result<T, ParserError>;

/// Everything a scene file describes.
pub struct SceneDescription {
    pub camera: CameraSettings,
    pub scene: Scene,
}

impl SceneParser<'_> {
    pub fn new<'a>(content: &'a str) -> SceneParser<'a> {
        SceneParser {
            content,
            position: FilePosition::new(),
            buffer: "".to_string(),
        }
    }

    fn get_current_char(self: &Self) -> Option<char> {
        self.content.chars().nth(self.position.index as usize)
    }

    fn is_empty(self: &Self) -> bool {
        self.get_current_char().is_none()
    }

    fn advance(self: &mut Self) -> bool {
        if let Some(current_char) = self.get_current_char() {
            if current_char == '\n' {
                self.position.on_new_line();
            } else {
                self.position.advance();
            }
            return true;
        }
        return false;
    }

    fn advance_until(self: &mut Self, f: impl Fn(char) -> bool) {
        while let Some(current_char) = self.get_current_char() {
            if f(current_char) {
                break;
            }
            self.advance();
        }
    }

    fn eat_spaces(self: &mut Self) {
        // skip blank space and comments up to the next token
        while let Some(current_char) = self.get_current_char() {
            if current_char == '#' {
                // the newline itself is consumed at the end of the loop
                self.advance_until(|c| c == '\n');
            } else if !current_char.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn pop(self: &mut Self) -> String {
        if !self.buffer.is_empty() {
            return std::mem::take(&mut self.buffer);
        }

        self.eat_spaces();
        let mut result = String::new();
        let Some(mut current_char) = self.get_current_char() else {
            return result;
        };
        // push the current char and return the next one
        let enqueue = move |parser: &mut SceneParser, result: &mut String| {
            if let Some(current_char) = parser.get_current_char() {
                result.push(current_char);
                parser.advance();
            }
            parser.get_current_char().unwrap_or(' ')
        };

        match current_char {
            ',' | '(' | ')' => {
                self.advance();
                result.push(current_char);
            }
            '.' | '+' | '-' | '0'..='9' => {
                if current_char == '+' || current_char == '-' {
                    current_char = enqueue(self, &mut result);
                }

                while current_char.is_ascii_digit() {
                    current_char = enqueue(self, &mut result);
                }

                if current_char == '.' {
                    current_char = enqueue(self, &mut result);
                    while current_char.is_ascii_digit() {
                        current_char = enqueue(self, &mut result);
                    }
                }
            }
            _ if current_char.is_alphabetic() => {
                while current_char.is_alphabetic() {
                    current_char = enqueue(self, &mut result);
                }
            }
            _ => {
                // unknown symbol: hand it to the caller so it shows up in the error
                self.advance();
                result.push(current_char);
            }
        }
        result
    }

    fn peek(self: &mut Self) -> &String {
        if self.buffer.is_empty() {
            self.buffer = self.pop();
        }
        &self.buffer
    }

    fn error<T>(self: &Self, message: &str) -> ParserResult<T> {
        Err(ParserError::new(message, self.position))
    }

    fn parse_float(self: &mut Self) -> ParserResult<f64> {
        let next_token = self.pop();
        if let Ok(num) = next_token.parse::<f64>() {
            Ok(num)
        } else {
            let message = format!("cannot interpret '{}' as a number", next_token);
            self.error(&message)
        }
    }

    fn parse_positive(self: &mut Self, what: &str) -> ParserResult<f64> {
        let value = self.parse_float()?;
        if value > 0.0 {
            Ok(value)
        } else {
            self.error(&format!("{} must be positive, got {}", what, value))
        }
    }

    fn parse_count(self: &mut Self, what: &str) -> ParserResult<u32> {
        let next_token = self.pop();
        match next_token.parse::<u32>() {
            Ok(count) => Ok(count),
            Err(_) => {
                let message = format!("{} must be a whole number, got '{}'", what, next_token);
                self.error(&message)
            }
        }
    }

    fn match_token(self: &mut Self, expected_lexem: &str) -> ParserResult<()> {
        let next_lexem = self.pop();
        if next_lexem != expected_lexem {
            let message = format!(
                "expected '{}', getting '{}' instead",
                expected_lexem, next_lexem
            );
            self.error(&message)
        } else {
            Ok(())
        }
    }

    fn maybe_match(self: &mut Self, expected_lexem: &str) -> bool {
        // consume the next lexem only when it is the expected one
        if *self.peek() == expected_lexem {
            self.pop();
            return true;
        }
        false
    }

    fn parse_header(self: &mut Self) -> ParserResult<(usize, usize)> {
        self.match_token("size")?;
        let width = self.parse_count("image width")?;
        let height = self.parse_count("image height")?;
        if width == 0 || height == 0 {
            return self.error("image size must not be empty");
        }
        Ok((width as usize, height as usize))
    }

    fn parse_vec3(self: &mut Self) -> ParserResult<Vec3> {
        self.match_token("(")?;
        let x = self.parse_float()?;
        self.match_token(",")?;
        let y = self.parse_float()?;
        self.match_token(",")?;
        let z = self.parse_float()?;
        self.match_token(")")?;
        Ok(Vec3::new(x, y, z))
    }

    fn parse_color(self: &mut Self) -> ParserResult<Rgb> {
        let named = [
            ("red", Rgb::new(1.0, 0.0, 0.0)),
            ("blue", Rgb::new(0.0, 0.0, 1.0)),
            ("green", Rgb::new(0.0, 1.0, 0.0)),
            ("white", Rgb::new(1.0, 1.0, 1.0)),
            ("black", Rgb::new(0.0, 0.0, 0.0)),
            ("gray", Rgb::new(0.5, 0.5, 0.5)),
            ("cyan", Rgb::new(0.0, 1.0, 1.0)),
            ("violet", Rgb::new(1.0, 0.0, 1.0)),
            ("yellow", Rgb::new(1.0, 1.0, 0.0)),
            ("orange", Rgb::new(0.98, 0.45, 0.02)),
        ];
        for (name, color) in named {
            if self.maybe_match(name) {
                return Ok(color);
            }
        }
        let v = self.parse_vec3()?;
        Ok(Rgb::new(v.x, v.y, v.z))
    }

    fn parse_sphere(self: &mut Self) -> ParserResult<Sphere> {
        self.match_token("sphere")?;
        let center = self.parse_vec3()?;
        let radius = self.parse_positive("sphere radius")?;
        let color = self.parse_color()?;
        Ok(Sphere::new(center, radius, color))
    }

    fn parse_light(self: &mut Self) -> ParserResult<Light> {
        self.match_token("light")?;
        let position = self.parse_vec3()?;
        let color = self.parse_color()?;
        Ok(Light::new(position, color))
    }

    fn parse_camera(&mut self, width: usize, height: usize) -> ParserResult<CameraSettings> {
        let mut camera = CameraSettings::default().with_resolution(width, height);
        if !self.maybe_match("camera") {
            return Ok(camera);
        }
        loop {
            if self.maybe_match("from") {
                camera.viewpoint = self.parse_vec3()?;
            } else if self.maybe_match("background") {
                camera.background_size_x = self.parse_positive("background width")?;
                camera.background_size_z = self.parse_positive("background height")?;
                camera.background_distance = self.parse_positive("background distance")?;
            } else if self.maybe_match("plane") {
                camera.image_plane_distance = self.parse_positive("image plane distance")?;
            } else {
                return Ok(camera);
            }
        }
    }

    /// Parse a whole scene file.
    pub fn parse_scene(self: &mut Self) -> ParserResult<SceneDescription> {
        let (width, height) = self.parse_header()?;
        let mut scene = Scene::new(DEFAULT_ITERATIONS);
        if self.maybe_match("iterations") {
            scene.set_iterations(self.parse_count("iterations")?);
        }
        let camera = self.parse_camera(width, height)?;

        while !self.is_empty() {
            let next_token = self.peek().clone();
            match next_token.as_str() {
                "light" => {
                    let light = self.parse_light()?;
                    scene.add_light(light);
                }
                "sphere" => {
                    let sphere = self.parse_sphere()?;
                    scene.add_object(sphere);
                }
                // trailing whitespace or comments
                "" => break,
                _ => {
                    let message = format!("unexpected token '{}'", next_token);
                    return self.error(&message);
                }
            }
        }
        Ok(SceneDescription { camera, scene })
    }
}

/// The scene rendered when no file is given: seven spheres under three
/// lights, seen from 20 units behind the origin.
pub fn demo_scene(width: usize, height: usize, iterations: u32) -> SceneDescription {
    let mut scene = Scene::new(iterations);
    let spheres = [
        ((0.0, 7.0, 2.0), 1.0, (1.0, 0.3, 0.3)),
        ((-3.0, 11.0, -2.0), 2.0, (0.3, 0.3, 1.0)),
        ((0.0, 8.0, -2.0), 1.0, (0.3, 1.0, 0.3)),
        ((1.5, 7.0, 0.5), 1.0, (0.5, 0.5, 0.5)),
        ((-2.0, 6.0, 1.0), 0.7, (0.3, 1.0, 1.0)),
        ((2.2, 8.0, 0.0), 1.0, (0.5, 0.5, 0.5)),
        ((4.0, 10.0, 1.0), 0.7, (0.3, 0.3, 1.0)),
    ];
    for ((x, y, z), radius, (r, g, b)) in spheres {
        scene.add_object(Sphere::new(Vec3::new(x, y, z), radius, Rgb::new(r, g, b)));
    }
    for (x, y, z) in [(-15.0, -15.0, 0.0), (1.0, 0.0, 1.0), (0.0, 6.0, -10.0)] {
        scene.add_light(Light::new(Vec3::new(x, y, z), Rgb::new(0.5, 0.5, 0.5)));
    }
    let camera = CameraSettings::default()
        .with_resolution(width, height)
        .with_viewpoint(Vec3::new(0.0, -20.0, 0.0));
    SceneDescription { camera, scene }
}
