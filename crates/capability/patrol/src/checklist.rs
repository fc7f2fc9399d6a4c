//! 检查清单：当前点位的临时检查状态（不持久化）。
//!
//! 每次扫码都会整体替换前一个未提交的清单，未提交内容直接丢弃。

use crate::error::PatrolError;
use domain::{ChecklistItem, Coordinates, EvidenceImage, LocationCheck, PatrolLocation};

/// 当前点位的检查状态。
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveChecklistState {
    location: PatrolLocation,
    checklist: Vec<ChecklistItem>,
    captured_images: Vec<EvidenceImage>,
    notes: String,
}

impl ActiveChecklistState {
    /// 以点位的必检项初始化（全部未完成，无图片，无备注）。
    pub fn initialize(location: &PatrolLocation) -> Self {
        Self {
            location: location.clone(),
            checklist: location
                .required_checks
                .iter()
                .map(|name| ChecklistItem {
                    name: name.clone(),
                    done: false,
                })
                .collect(),
            captured_images: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn location(&self) -> &PatrolLocation {
        &self.location
    }

    pub fn checklist(&self) -> &[ChecklistItem] {
        &self.checklist
    }

    pub fn captured_images(&self) -> &[EvidenceImage] {
        &self.captured_images
    }

    pub fn notes(&self) -> Option<&str> {
        let notes = self.notes.trim();
        if notes.is_empty() { None } else { Some(notes) }
    }

    /// 设置单个检查项。不在清单内的名称静默忽略；返回是否命中。
    pub fn set_check_value(&mut self, check_name: &str, done: bool) -> bool {
        match self.checklist.iter_mut().find(|item| item.name == check_name) {
            Some(item) => {
                item.done = done;
                true
            }
            None => false,
        }
    }

    /// 追加图片（保持顺序，不去重），返回追加数量。
    pub fn add_images(&mut self, images: Vec<EvidenceImage>) -> usize {
        let added = images.len();
        self.captured_images.extend(images);
        added
    }

    /// 替换备注缓冲区。
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// 尚未完成的检查项（清单顺序）。
    pub fn pending_checks(&self) -> Vec<String> {
        self.checklist
            .iter()
            .filter(|item| !item.done)
            .map(|item| item.name.clone())
            .collect()
    }

    /// 全部检查项完成且至少一张图片。
    pub fn is_ready_to_submit(&self) -> bool {
        self.checklist.iter().all(|item| item.done) && !self.captured_images.is_empty()
    }

    /// 生成点位检查记录；未满足提交条件时返回 `IncompleteChecklist`。
    pub fn build_location_check(
        &self,
        session_id: &str,
        checked_at_ms: i64,
        coordinates: Option<Coordinates>,
    ) -> Result<LocationCheck, PatrolError> {
        if !self.is_ready_to_submit() {
            return Err(PatrolError::IncompleteChecklist {
                pending_checks: self.pending_checks(),
                missing_evidence: self.captured_images.is_empty(),
            });
        }
        Ok(LocationCheck {
            check_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            location_id: self.location.location_id.clone(),
            location_code: self.location.code.clone(),
            department: self.location.department,
            checked_at_ms,
            checklist_completed: true,
            checklist: self.checklist.clone(),
            evidence_images: self.captured_images.clone(),
            notes: self.notes().map(str::to_string),
            coordinates,
        })
    }
}
