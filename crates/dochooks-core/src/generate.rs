//! Random API reference document generation for benchmarking and testing.
//!
//! Generated documents follow the house style, so every checker passes on
//! them as long as the link targets exist (see [`LINK_TARGETS`]).

use rand::prelude::*;
use rand::rngs::StdRng;

/// Relative link targets used by generated documents, as seen from the
/// document's directory.
pub const LINK_TARGETS: &[&str] = &["../guide/", "../overview.md", "index_cn.rst"];

/// Configuration for generating API reference documents.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of parameters of the declared API.
    pub num_parameters: usize,
    /// Number of description paragraphs.
    pub num_paragraphs: usize,
    /// Number of relative links spread over the description.
    pub num_links: usize,
    /// Seed for deterministic generation.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_parameters: 5,
            num_paragraphs: 5,
            num_links: 2,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with the given parameter count and proportional
    /// description.
    pub fn new(num_parameters: usize) -> Self {
        Self {
            num_parameters,
            num_paragraphs: num_parameters.max(1),
            num_links: num_parameters / 2,
            ..Default::default()
        }
    }

    /// Small fixture (~3 parameters).
    pub fn small() -> Self {
        Self::new(3)
    }

    /// Medium fixture (~30 parameters).
    pub fn medium() -> Self {
        Self::new(30)
    }

    /// Large fixture (~300 parameters).
    pub fn large() -> Self {
        Self::new(300)
    }

    /// Set the random seed for deterministic generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of description paragraphs.
    pub fn with_paragraphs(mut self, num_paragraphs: usize) -> Self {
        self.num_paragraphs = num_paragraphs;
        self
    }

    /// Set the number of relative links.
    pub fn with_links(mut self, num_links: usize) -> Self {
        self.num_links = num_links;
        self
    }
}

mod vocabulary {
    pub const API_NAMES: &[&str] = &["add", "matmul", "reshape", "concat", "softmax", "linear"];
    pub const PARAMETER_WORDS: &[&str] = &["x", "y", "axis", "shape", "dtype", "keepdim", "weight", "bias"];
    pub const TYPES: &[&str] = &["Tensor", "int", "float", "bool", "str", "list", "tuple"];
    pub const DEFAULTS: &[&str] = &["None", "0", "1.0", "False", "'float32'", "[1, 2]"];
    pub const PHRASES: &[&str] = &[
        "对输入 Tensor 逐元素计算",
        "支持广播机制",
        "返回一个新的 Tensor",
        "当 axis 为 None 时对所有元素计算",
        "该 API 支持动态图和静态图",
        "数据类型与输入保持一致",
    ];
}

fn pick<'a>(rng: &mut StdRng, words: &[&'a str]) -> &'a str {
    words[rng.random_range(0..words.len())]
}

/// A generated parameter: name, type, and default when optional.
struct Parameter {
    name: String,
    type_name: &'static str,
    default: Option<&'static str>,
}

fn generate_parameters(rng: &mut StdRng, count: usize) -> Vec<Parameter> {
    use vocabulary::*;

    // Required parameters come first, the rest have defaults.
    let required = count.div_ceil(2);
    (0..count)
        .map(|index| Parameter {
            name: format!("{}{}", pick(rng, PARAMETER_WORDS), index),
            type_name: pick(rng, TYPES),
            default: (index >= required).then(|| pick(rng, DEFAULTS)),
        })
        .collect()
}

/// Generates an API reference document.
pub fn generate(config: &GeneratorConfig) -> String {
    use vocabulary::*;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let api = pick(&mut rng, API_NAMES);
    let parameters = generate_parameters(&mut rng, config.num_parameters);
    let rule = ":".repeat(12);

    let signature = parameters
        .iter()
        .map(|p| match p.default {
            Some(default) => format!("{}={}", p.name, default),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::new();
    out.push_str(&format!(".. _cn_api_paddle_{api}:\n\n"));
    out.push_str(&format!("{api}\n{}\n\n", "-".repeat(31)));
    out.push_str(&format!(".. py:function:: paddle.{api}({signature})\n\n"));

    let mut links_left = config.num_links;
    for index in 0..config.num_paragraphs {
        let mut paragraph = format!("{}，{}。", pick(&mut rng, PHRASES), pick(&mut rng, PHRASES));
        let paragraphs_left = config.num_paragraphs - index;
        let links_here = links_left.div_ceil(paragraphs_left);
        for _ in 0..links_here {
            let target = pick(&mut rng, LINK_TARGETS);
            paragraph.push_str(&format!(" 详见 `文档 <{target}>`_ 。"));
        }
        links_left -= links_here;
        out.push_str(&paragraph);
        out.push_str("\n\n");
    }

    out.push_str(&format!("参数\n{rule}\n\n"));
    for p in &parameters {
        let optional = if p.default.is_some() { "，可选" } else { "" };
        let description = pick(&mut rng, PHRASES);
        out.push_str(&format!(
            "    - **{}** ({}{}) - {}。\n",
            p.name, p.type_name, optional, description
        ));
    }
    if parameters.is_empty() {
        out.push_str("无。\n");
    }

    out.push_str(&format!("\n返回\n{rule}\n\nTensor，{}。\n\n", pick(&mut rng, PHRASES)));
    out.push_str(&format!("代码示例\n{rule}\n\nCOPY-FROM: paddle.{api}\n"));
    out
}
