//! 配置页上的应用参数

use serde::{Deserialize, Serialize};

/// 标签相对输入框的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelPlacement {
    #[default]
    Before,
    After,
    None,
}

/// 单个表单字段，值缓冲区有固定最大长度
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigField {
    id: Option<String>,
    placeholder: String,
    value: String,
    max_len: usize,
    custom_html: String,
    label: LabelPlacement,
}

impl ConfigField {
    /// `max_len` 按字节计，默认值超长会被截断
    pub fn new(id: &str, placeholder: &str, default_value: &str, max_len: usize) -> Self {
        let mut field = Self {
            id: Some(id.to_string()),
            placeholder: placeholder.to_string(),
            value: String::with_capacity(max_len),
            max_len,
            custom_html: String::new(),
            label: LabelPlacement::Before,
        };
        field.set_value(default_value);
        field
    }

    /// 纯 HTML 片段，原样输出，不参与保存
    pub fn custom(html: &str) -> Self {
        Self {
            id: None,
            placeholder: String::new(),
            value: String::new(),
            max_len: 0,
            custom_html: html.to_string(),
            label: LabelPlacement::Before,
        }
    }

    /// 放进 `<input>` 标签的额外属性
    pub fn with_custom_html(mut self, html: &str) -> Self {
        self.custom_html = html.to_string();
        self
    }

    pub fn with_label(mut self, label: LabelPlacement) -> Self {
        self.label = label;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn custom_html(&self) -> &str {
        &self.custom_html
    }

    pub fn label(&self) -> LabelPlacement {
        self.label
    }

    /// 替换值，最多保留 `max_len` 字节，在字符边界截断
    pub fn set_value(&mut self, value: &str) {
        let mut end = value.len().min(self.max_len);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        self.value.clear();
        self.value.push_str(&value[..end]);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 不允许扩容且已满
    Full { capacity: usize },
    /// 需要扩容但内存分配失败
    Alloc { requested: usize },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Full { capacity } => {
                write!(f, "parameter registry full ({} slots)", capacity)
            }
            RegistryError::Alloc { requested } => {
                write!(f, "failed to grow parameter registry to {} slots", requested)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// 按注册顺序保存的参数表，显式记录槽位数
///
/// 用 `register` 返回的下标访问字段，扩容不会改变已发出的下标
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    fields: Vec<ConfigField>,
    capacity: usize,
    growth: usize,
}

impl ParameterRegistry {
    /// `growth == 0` 时容量固定为 `capacity`
    pub fn new(capacity: usize, growth: usize) -> Self {
        let mut fields = Vec::new();
        let capacity = match fields.try_reserve_exact(capacity) {
            Ok(()) => capacity,
            Err(e) => {
                log::error!("could not preallocate {} parameter slots: {}", capacity, e);
                // 只记实际分配到的槽位
                fields.capacity()
            }
        };
        Self {
            fields,
            capacity,
            growth,
        }
    }

    /// 追加字段并返回下标
    ///
    /// 失败时不做任何修改，数量、容量和已有字段保持原样
    pub fn register(&mut self, field: ConfigField) -> Result<usize, RegistryError> {
        if self.fields.len() == self.capacity {
            self.grow()?;
        }

        log::info!("Adding parameter {:?}", field.id());
        self.fields.push(field);
        Ok(self.fields.len() - 1)
    }

    fn grow(&mut self) -> Result<(), RegistryError> {
        if self.growth == 0 {
            log::warn!("Can't add parameter. Full");
            return Err(RegistryError::Full {
                capacity: self.capacity,
            });
        }

        let requested = self.capacity.saturating_add(self.growth);
        let additional = requested - self.fields.len();
        if let Err(e) = self.fields.try_reserve_exact(additional) {
            log::error!("failed to grow params to {}: {}", requested, e);
            return Err(RegistryError::Alloc { requested });
        }

        log::info!("Increasing max params to: {}", requested);
        self.capacity = requested;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.fields.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// # Panics
    ///
    /// `index >= count()` 时 panic
    pub fn at(&self, index: usize) -> &ConfigField {
        &self.fields[index]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut ConfigField {
        &mut self.fields[index]
    }

    pub fn full_list(&self) -> &[ConfigField] {
        &self.fields
    }

    /// 按 id 查找字段
    pub fn get(&self, id: &str) -> Option<&ConfigField> {
        self.fields.iter().find(|f| f.id() == Some(id))
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, ConfigField> {
        self.fields.iter_mut()
    }
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new(crate::config::MAX_PARAMS_STEP, crate::config::MAX_PARAMS_STEP)
    }
}
