//! End-to-end checks over complete API reference documents.

use dochooks_core::check::{
    CheckConfig, CheckReport, CheckerKind, HttpClient, LinkProbe, ProbeError, ValidationError,
    chain_factory, check_document,
};
use dochooks_core::parse::parse_rst;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const ADD_CN: &str = "\
.. _cn_api_paddle_add:

add
-------------------------------

.. py:function:: paddle.add(x, y, name=None)

逐元素相加算子，输入 ``x`` 与 ``y`` 逐元素相加，并将各个位置的输出元素保存到返回结果中。

输入 ``x`` 与 ``y`` 必须可以广播为相同形状，关于广播规则，请参见 `Tensor 介绍 <../../guides/beginner/tensor_cn.html>`_ 。

.. note::
   ``paddle.add`` 遵守广播机制。

参数
::::::::::::

    - **x** (Tensor) - 输入的 Tensor，数据类型为：float32、float64、int32、int64。
    - **y** (Tensor) - 输入的 Tensor，数据类型为：float32、float64、int32、int64。
    - **name** (str，可选) - 具体用法请参见 :ref:`api_guide_Name`，一般无需设置，默认值为 None。

返回
::::::::::::

多维 Tensor，数据类型与 ``x`` 相同，维度为广播后的形状。

代码示例
::::::::::::

COPY-FROM: paddle.add
";

const LINEAR_CN: &str = "\
.. _cn_api_paddle_nn_Linear:

Linear
-------------------------------

.. py:class:: paddle.nn.Linear(in_features, out_features, weight_attr=None, bias_attr=None, name=None)

线性变换层，详见 https://www.paddlepaddle.org.cn/documentation 。

参数
::::::::::::

    - **in_features** (int) - 线性变换层输入单元的数目。
    - **out_features** (int) - 线性变换层输出单元的数目。
    - **weight_attr** (ParamAttr，可选) - 指定权重参数的属性，默认值为 None。
    - **bias_attr** (ParamAttr，可选) - 指定偏置参数的属性，默认值为 None。
    - **name** (str，可选) - 一般无需设置，默认值为 None。

属性
::::::::::::

weight
'''''''''

本层的可学习参数，类型为 ``Parameter``。

方法
::::::::::::

forward(input)
'''''''''

前向计算。

**参数**

    - **input** (Tensor) - 输入的 Tensor。

代码示例
::::::::::::

COPY-FROM: paddle.nn.Linear
";

/// Answers 404 for URLs containing `gone`, 200 otherwise.
struct StaticClient;

impl HttpClient for StaticClient {
    fn head(&self, url: &str) -> Result<u16, ProbeError> {
        Ok(if url.contains("gone") { 404 } else { 200 })
    }
}

/// A docs tree holding the link targets of the documents above.
struct DocsTree {
    dir: TempDir,
}

impl DocsTree {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs/api/paddle/nn")).unwrap();
        fs::create_dir_all(dir.path().join("docs/guides/beginner")).unwrap();
        // Linked as `.html`, present as `.rst`
        fs::write(dir.path().join("docs/guides/beginner/tensor_cn.rst"), "Tensor\n======\n").unwrap();
        Self { dir }
    }

    fn source(&self, name: &str) -> PathBuf {
        self.dir.path().join("docs/api/paddle").join(name)
    }

    fn check(&self, name: &str, text: &str, kinds: &[CheckerKind], abort: bool) -> CheckReport {
        let source = self.source(name);
        let doc = parse_rst(text, &source.to_string_lossy()).unwrap();
        let factory = chain_factory(
            kinds,
            abort,
            Arc::new(CheckConfig::default()),
            Arc::new(LinkProbe::new(Box::new(StaticClient))),
        );
        check_document(&factory, &doc)
    }
}

fn errors(report: &CheckReport) -> Vec<ValidationError> {
    report.diagnostics.iter().map(|d| d.error.clone()).collect()
}

#[test]
fn function_document_passes_every_check() {
    let tree = DocsTree::new();
    let report = tree.check("add_cn.rst", ADD_CN, &CheckerKind::all(), false);
    assert!(report.passed, "{:?}", report.diagnostics);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn class_document_passes_every_check() {
    let tree = DocsTree::new();
    let report = tree.check("nn/Linear_cn.rst", LINEAR_CN, &CheckerKind::all(), false);
    assert!(report.passed, "{:?}", report.diagnostics);
}

#[test]
fn missing_parameter_is_reported_on_the_list() {
    let tree = DocsTree::new();
    let text = ADD_CN.replace(
        "    - **y** (Tensor) - 输入的 Tensor，数据类型为：float32、float64、int32、int64。\n",
        "",
    );
    let report = tree.check("add_cn.rst", &text, &CheckerKind::all(), false);
    assert!(!report.passed);
    assert_eq!(
        errors(&report),
        vec![ValidationError::ParameterCountMismatch {
            line: Some(18),
            expected: 3,
            found: 2,
        }]
    );
}

#[test]
fn optional_flag_mismatch_names_the_parameter() {
    let tree = DocsTree::new();
    let text = ADD_CN.replace("(str，可选)", "(str)");
    let report = tree.check("add_cn.rst", &text, &[CheckerKind::Parameters], false);
    assert!(!report.passed);
    assert_eq!(
        errors(&report),
        vec![ValidationError::ParameterOptionalMismatch {
            line: Some(18),
            index: 3,
            name: "name".to_string(),
            expected: true,
            found: false,
        }]
    );
}

#[test]
fn code_block_in_example_section() {
    let tree = DocsTree::new();
    let text = ADD_CN.replace(
        "COPY-FROM: paddle.add\n",
        ".. code-block:: python\n\n    import paddle\n    paddle.add(x, y)\n",
    );
    let report = tree.check("add_cn.rst", &text, &CheckerKind::all(), false);
    assert!(!report.passed);
    assert_eq!(
        errors(&report),
        vec![ValidationError::CodeBlockInExample { line: Some(30) }]
    );
}

#[test]
fn english_house_style_is_applied_by_every_checker() {
    let text = "\
f
====

.. py:function:: f(x, y)

Parameters
----------

    - **x** (int) - The first value.

Code Example
------------

.. code-block:: python

    f(1, 2)
";
    let titles = || vec!["Parameters".to_string(), "Code Example".to_string()];
    let config = CheckConfig::new()
        .with_parameters_section("Parameters")
        .with_code_example_section("Code Example")
        .with_allowed_h2_titles(titles())
        .with_required_h2_titles(titles());
    let factory = chain_factory(
        &[CheckerKind::Title, CheckerKind::Parameters, CheckerKind::CodeExample],
        false,
        Arc::new(config),
        Arc::new(LinkProbe::offline()),
    );

    let report = check_document(&factory, &parse_rst(text, "f.rst").unwrap());
    assert!(!report.passed);
    let found = errors(&report);
    assert_eq!(found.len(), 2);
    assert!(matches!(
        found[0],
        ValidationError::ParameterCountMismatch { expected: 2, found: 1, .. }
    ));
    assert_eq!(found[1], ValidationError::CodeBlockInExample { line: Some(14) });
}

#[test]
fn diagnostics_render_with_source_and_line() {
    let doc = parse_rst(&ADD_CN.replace("COPY-FROM: paddle.add", "COPY-FROM paddle.add"), "add_cn.rst")
        .unwrap();
    let factory = chain_factory(
        &[CheckerKind::CodeExample],
        false,
        Arc::new(CheckConfig::default()),
        Arc::new(LinkProbe::offline()),
    );
    let report = check_document(&factory, &doc);
    // Without the colon the paragraph is not a copy reference at all
    assert!(report.passed);

    let doc = parse_rst(&ADD_CN.replace("paddle.add\n", "paddle..add\n"), "add_cn.rst").unwrap();
    let report = check_document(&factory, &doc);
    assert!(!report.passed);
    let rendered: Vec<String> = report.diagnostics.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "add_cn.rst:30: Invalid `COPY-FROM` format. Please use `COPY-FROM: <full_API_path>`. \
             Got COPY-FROM: paddle..add."
                .to_string()
        ]
    );
}

#[test]
fn dead_relative_link_is_reported() {
    let tree = DocsTree::new();
    let text = ADD_CN.replace("beginner/tensor_cn.html", "beginner/missing_cn.html");
    let report = tree.check("add_cn.rst", &text, &CheckerKind::all(), false);
    assert!(!report.passed);
    assert_eq!(
        errors(&report),
        vec![ValidationError::dead_file_link("../../guides/beginner/missing_cn.html", Some(10))]
    );
}

#[test]
fn dead_http_link_is_reported() {
    let tree = DocsTree::new();
    let text = LINEAR_CN.replace("https://www.paddlepaddle.org.cn/documentation", "https://gone.example/");
    let report = tree.check("nn/Linear_cn.rst", &text, &[CheckerKind::DeadLink], false);
    assert_eq!(
        errors(&report),
        vec![ValidationError::dead_http_link("https://gone.example/", Some(8))]
    );
}

#[test]
fn abort_on_failure_stops_at_the_first_failing_checker() {
    let tree = DocsTree::new();
    let text = ADD_CN
        .replace("代码示例\n::::::::::::\n\nCOPY-FROM: paddle.add\n", "")
        .replace("beginner/tensor_cn.html", "beginner/missing_cn.html");
    let kinds = [CheckerKind::Title, CheckerKind::DeadLink];

    let report = tree.check("add_cn.rst", &text, &kinds, true);
    assert!(!report.passed);
    assert_eq!(
        errors(&report),
        vec![ValidationError::MissingH2Title {
            title: "代码示例".to_string()
        }]
    );

    let report = tree.check("add_cn.rst", &text, &kinds, false);
    assert!(!report.passed);
    let checkers: Vec<&str> = report.diagnostics.iter().map(|d| d.checker).collect();
    assert_eq!(checkers, vec!["title", "dead-link"]);
}

#[test]
fn checking_twice_gives_the_same_report() {
    let tree = DocsTree::new();
    let text = ADD_CN.replace("(str，可选)", "(str)");
    let source = tree.source("add_cn.rst");
    let doc = parse_rst(&text, &source.to_string_lossy()).unwrap();
    let factory = chain_factory(
        &CheckerKind::all(),
        false,
        Arc::new(CheckConfig::default()),
        Arc::new(LinkProbe::new(Box::new(StaticClient))),
    );
    let first = check_document(&factory, &doc);
    let second = check_document(&factory, &doc);
    assert!(!first.passed);
    assert_eq!(first, second);
}
