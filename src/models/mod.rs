//! 数据模型模块

pub mod alert_rule;
pub mod business;
pub mod credential;
pub mod dashboard;
pub mod department;
pub mod note;
pub mod site;
pub mod staff;
pub mod user;

use validator::ValidationError;

/// 拒绝只含空白字符的字符串（长度校验不会 trim）
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}
