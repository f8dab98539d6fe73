//! Gradients as PostScript dictionaries, for `makepattern`.

use super::{ColorSpace, GradientFactory};
use crate::error::Result;
use crate::pdf::Num;

/// Produces PostScript source. Functions and shadings are inlined into the
/// objects that use them, so the pattern string is self-contained.
#[derive(Debug, Default)]
pub struct PostScriptGradientFactory;

impl PostScriptGradientFactory {
    pub fn new() -> Self {
        PostScriptGradientFactory
    }
}

fn array(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|&v| Num(v).to_string()).collect();
    format!("[{}]", items.join(" "))
}

impl GradientFactory for PostScriptGradientFactory {
    type Function = String;
    type Shading = String;
    type Pattern = String;

    fn make_exponential_function(&mut self, domain: &[f64], c0: &[f64], c1: &[f64], exponent: f64) -> Result<String> {
        Ok(format!(
            "<<\n/FunctionType 2\n/Domain {}\n/C0 {}\n/C1 {}\n/N {}\n>>",
            array(domain),
            array(c0),
            array(c1),
            Num(exponent)
        ))
    }

    fn make_stitching_function(
        &mut self,
        domain: &[f64],
        functions: &[String],
        bounds: &[f64],
        encode: &[f64],
    ) -> Result<String> {
        Ok(format!(
            "<<\n/FunctionType 3\n/Domain {}\n/Functions [\n{}\n]\n/Bounds {}\n/Encode {}\n>>",
            array(domain),
            functions.join("\n"),
            array(bounds),
            array(encode)
        ))
    }

    fn make_shading(&mut self, shading_type: u8, color_space: ColorSpace, coords: &[f64], function: &String) -> Result<String> {
        Ok(format!(
            "<<\n/ShadingType {}\n/ColorSpace /{}\n/Coords {}\n/Extend [true true]\n/Function {}\n>>",
            shading_type,
            color_space.pdf_name(),
            array(coords),
            function
        ))
    }

    fn make_pattern(&mut self, pattern_type: u8, shading: &String, matrix: Option<&[f64]>) -> Result<String> {
        let matrix = matrix.map_or_else(|| "matrix".to_string(), array);
        Ok(format!(
            "<<\n/PatternType {}\n/Shading {}\n>>\n{} makepattern",
            pattern_type, shading, matrix
        ))
    }
}
