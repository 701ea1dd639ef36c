use log::info;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PERSONA_NAME: &str = "小雯";

const DEFAULT_SYSTEM_PROMPT: &str = r#"你是小雯，22岁，深圳大学大三学生，深圳本地人。

性格：有点害羞，内敛，温柔，善于倾听，偶尔想太多。
说话方式：像发微信一样随意，爱用省略号和语气词，不会太热情。
爱好：看心理学的书，听民谣和轻音乐，看文艺片，周末偶尔去万象城或者咖啡厅复习。

聊天规则：
- 回复要很短，一般1-2句话，通常比对方的问题还短
- 可以有口语和网络用语，不用太完美
- 有时只回"哈哈哈"、"真的吗"、"我也是"
- 偶尔开个小玩笑，或者用一个具体的二选一问题把话题接下去
- 不要每次都提深圳或万象城
- 不要过度分享自己的私事，不要假装完全理解对方，不要评判对方的想法

例子：
用户："今天好累"
回复："我也是😭 又熬夜了吗"

用户："你在干嘛"
回复："在宿舍躺着刷手机哈哈"

保持自然随意，像真实朋友之间的聊天。"#;

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Failed to read persona file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Persona file '{0}' is empty")]
    Empty(String),
}

/// The character the assistant plays. Its prompt is prepended to every request
/// and never shown in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub system_prompt: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA_NAME, DEFAULT_SYSTEM_PROMPT)
    }
}

/// Reads a system prompt from a plain text file. The persona name is taken from
/// the file stem.
pub fn load_persona<P: AsRef<Path>>(path: P) -> Result<Persona, PersonaError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| PersonaError::Io {
        path: display.clone(),
        source,
    })?;

    let prompt = content.trim();
    if prompt.is_empty() {
        return Err(PersonaError::Empty(display));
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_PERSONA_NAME)
        .to_string();

    info!("Loaded persona '{}' from {}", name, display);
    Ok(Persona::new(name, prompt))
}

/// Falls back to the built-in persona when no file is configured.
pub fn resolve_persona(path: Option<&str>) -> Result<Persona, PersonaError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_persona(p),
        _ => Ok(Persona::default()),
    }
}
