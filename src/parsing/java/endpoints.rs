//! Entry-point detection from Java annotations
//!
//! Recognised families:
//! - Spring MVC `@GetMapping` .. `@RequestMapping`, prefixed by a class-level `@RequestMapping`
//! - JAX-RS `@GET` .. `@OPTIONS` with `@Path` on the method and class
//! - `@KafkaListener`, `@RabbitListener` and `@EventListener` consumers

use super::constants::{JAX_RS_METHODS, SPRING_MAPPINGS};
use crate::parsing::facts::{AnnotationFact, ParamFact, RestEndpoint};
use regex::Regex;
use std::sync::LazyLock;

static NAMED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:value|path)\s*=\s*\{?\s*"([^"]*)""#).expect("valid path pattern")
});
static POSITIONAL_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^@[\w.]+\s*\(\s*\{?\s*"([^"]*)""#).expect("valid positional pattern")
});
static REQUEST_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bmethod\s*=\s*\{?\s*RequestMethod\.(\w+)").expect("valid method pattern")
});
static PRODUCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bproduces\s*=\s*\{?\s*"([^"]*)""#).expect("valid produces pattern")
});
static CONSUMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bconsumes\s*=\s*\{?\s*"([^"]*)""#).expect("valid consumes pattern")
});
static TOPICS_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btopics\s*=\s*\{([^}]*)\}").expect("valid topics pattern"));
static TOPICS_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\btopics\s*=\s*("[^"]+"|'[^']+'|[A-Za-z_][\w.]*)"#).expect("valid topic pattern")
});
static TOPIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\btopicPattern\s*=\s*("[^"]+"|'[^']+')"#).expect("valid topicPattern pattern")
});
static FIRST_ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^@[\w.]+\s*\(\s*(\{[^}]*\}|"[^"]+"|'[^']+'|[A-Za-z_][\w.]*)\s*[,)]"#)
        .expect("valid argument pattern")
});
static QUEUES_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bqueues\s*=\s*\{([^}]*)\}").expect("valid queues pattern"));
static QUEUES_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bqueues\s*=\s*("[^"]+"|'[^']+'|[A-Za-z_][\w.]*)"#).expect("valid queue pattern")
});
static CLASSES_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclasses\s*=\s*\{([^}]*)\}").expect("valid classes pattern"));
static CLASSES_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bclasses\s*=\s*([A-Za-z_][\w.]*\.class)").expect("valid class pattern")
});

pub const KAFKA_CONSUMER: &str = "KAFKA_CONSUMER";
pub const RABBIT_CONSUMER: &str = "RABBIT_CONSUMER";
pub const SPRING_EVENT_CONSUMER: &str = "SPRING_EVENT_CONSUMER";

/// All entry points declared on one method
pub fn extract_endpoints(
    method_annotations: &[AnnotationFact],
    class_annotations: &[AnnotationFact],
    params: &[ParamFact],
) -> Vec<RestEndpoint> {
    let mut endpoints = Vec::new();

    for annotation in method_annotations {
        let name = annotation.simple_name();

        if let Some(verb) = spring_verb(name) {
            endpoints.push(spring_endpoint(annotation, verb, class_annotations));
        } else if JAX_RS_METHODS.contains(&name) {
            endpoints.push(jax_rs_endpoint(name, method_annotations, class_annotations));
        } else if name == "KafkaListener" {
            endpoints.extend(
                kafka_topics(&annotation.text)
                    .into_iter()
                    .map(|topic| RestEndpoint::consumer(KAFKA_CONSUMER, topic)),
            );
        } else if name == "RabbitListener" {
            endpoints.extend(
                rabbit_queues(&annotation.text)
                    .into_iter()
                    .map(|queue| RestEndpoint::consumer(RABBIT_CONSUMER, queue)),
            );
        } else if name == "EventListener" {
            endpoints.extend(
                event_classes(&annotation.text, params)
                    .into_iter()
                    .map(|event| RestEndpoint::consumer(SPRING_EVENT_CONSUMER, event)),
            );
        }
    }

    endpoints
}

fn spring_verb(simple_name: &str) -> Option<&'static str> {
    SPRING_MAPPINGS
        .iter()
        .find(|(annotation, _)| *annotation == simple_name)
        .map(|(_, verb)| *verb)
}

fn spring_endpoint(
    annotation: &AnnotationFact,
    verb: &str,
    class_annotations: &[AnnotationFact],
) -> RestEndpoint {
    let mut kind = verb.to_string();
    if annotation.simple_name() == "RequestMapping" {
        if let Some(m) = REQUEST_METHOD.captures(&annotation.text) {
            kind = m[1].to_string();
        }
    }

    let class_path = class_annotations
        .iter()
        .find(|a| a.simple_name() == "RequestMapping")
        .map(|a| annotation_path(&a.text))
        .unwrap_or_default();

    RestEndpoint {
        kind,
        path: Some(merge_paths(&class_path, &annotation_path(&annotation.text))),
        produces: capture(&PRODUCES, &annotation.text),
        consumes: capture(&CONSUMES, &annotation.text),
    }
}

fn jax_rs_endpoint(
    verb: &str,
    method_annotations: &[AnnotationFact],
    class_annotations: &[AnnotationFact],
) -> RestEndpoint {
    let path_of = |annotations: &[AnnotationFact]| {
        annotations
            .iter()
            .find(|a| a.simple_name() == "Path")
            .map(|a| annotation_path(&a.text))
            .unwrap_or_default()
    };
    let media_of = |name: &str| {
        method_annotations
            .iter()
            .find(|a| a.simple_name() == name)
            .and_then(|a| capture(&POSITIONAL_STRING, &a.text))
    };

    RestEndpoint {
        kind: verb.to_string(),
        path: Some(merge_paths(
            &path_of(class_annotations),
            &path_of(method_annotations),
        )),
        produces: media_of("Produces"),
        consumes: media_of("Consumes"),
    }
}

/// `value=`/`path=` wins over the first positional string
fn annotation_path(text: &str) -> String {
    capture(&NAMED_PATH, text)
        .or_else(|| capture(&POSITIONAL_STRING, text))
        .unwrap_or_default()
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern.captures(text).map(|c| c[1].to_string())
}

/// Join a class-level prefix and a method path with exactly one slash
pub fn merge_paths(class_path: &str, method_path: &str) -> String {
    match (class_path.is_empty(), method_path.is_empty()) {
        (false, false) => format!(
            "{}/{}",
            class_path.trim_end_matches('/'),
            method_path.trim_start_matches('/')
        ),
        (false, true) => class_path.to_string(),
        _ => method_path.to_string(),
    }
}

fn kafka_topics(text: &str) -> Vec<String> {
    if let Some(m) = TOPICS_LIST.captures(text) {
        return split_and_clean(&m[1]);
    }
    if let Some(m) = TOPICS_SINGLE.captures(text) {
        return vec![clean_token(&m[1])];
    }
    if !text.contains("topicPattern") {
        if let Some(m) = FIRST_ARGUMENT.captures(text) {
            let arg = m[1].trim();
            if let Some(inner) = arg.strip_prefix('{').and_then(|a| a.strip_suffix('}')) {
                return split_and_clean(inner);
            }
            return vec![clean_token(arg)];
        }
    }
    if let Some(m) = TOPIC_PATTERN.captures(text) {
        return vec![format!("PATTERN:{}", clean_token(&m[1]))];
    }
    Vec::new()
}

fn rabbit_queues(text: &str) -> Vec<String> {
    if let Some(m) = QUEUES_LIST.captures(text) {
        return split_and_clean(&m[1]);
    }
    QUEUES_SINGLE
        .captures(text)
        .map(|m| vec![clean_token(&m[1])])
        .unwrap_or_default()
}

/// Falls back to the first parameter's simple type name
fn event_classes(text: &str, params: &[ParamFact]) -> Vec<String> {
    if let Some(m) = CLASSES_LIST.captures(text) {
        return split_and_clean(&m[1]);
    }
    if let Some(m) = CLASSES_SINGLE.captures(text) {
        return vec![clean_token(&m[1])];
    }
    params
        .first()
        .map(|p| {
            let base = p.type_name.split('<').next().unwrap_or(&p.type_name);
            vec![base.rsplit('.').next().unwrap_or(base).trim().to_string()]
        })
        .unwrap_or_default()
}

fn split_and_clean(list: &str) -> Vec<String> {
    list.split(',')
        .map(clean_token)
        .filter(|token| !token.is_empty())
        .collect()
}

fn clean_token(token: &str) -> String {
    token
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .replace(".class", "")
        .trim()
        .to_string()
}
