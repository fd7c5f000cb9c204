use uuid::Uuid;

use crate::model::tag::{Tag, TagColor};
use crate::model::task::Task;
use crate::ops::task_ops::TaskError;
use crate::util::unicode::char_count;

/// Maximum tag name length, in characters, after trimming
pub const TAG_NAME_MAX: usize = 50;

pub fn validate_tag_name(name: &str) -> Result<String, TaskError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || char_count(trimmed) > TAG_NAME_MAX {
        return Err(TaskError::ValidationRejected("tag name"));
    }
    Ok(trimmed.to_string())
}

pub fn find_tag(tags: &[Tag], id: Uuid) -> Option<&Tag> {
    tags.iter().find(|t| t.id == id)
}

/// Find a tag by name, ignoring case
pub fn find_tag_by_name<'a>(tags: &'a [Tag], name: &str) -> Option<&'a Tag> {
    let name = name.trim().to_lowercase();
    tags.iter().find(|t| t.name.to_lowercase() == name)
}

/// Validate and append a new tag. Returns its id.
pub fn add_tag(tags: &mut Vec<Tag>, name: &str, color: TagColor) -> Result<Uuid, TaskError> {
    let tag = Tag::new(validate_tag_name(name)?, color);
    let id = tag.id;
    tags.push(tag);
    Ok(id)
}

/// Rename and/or recolor a tag. A rejected name leaves the color untouched too.
/// Returns false when the tag already has the requested name and color.
pub fn update_tag(
    tags: &mut [Tag],
    id: Uuid,
    name: Option<&str>,
    color: Option<TagColor>,
) -> Result<bool, TaskError> {
    let name = name.map(validate_tag_name).transpose()?;
    let tag = tags
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(TaskError::NotFound(id))?;
    let mut changed = false;
    if let Some(name) = name
        && name != tag.name
    {
        tag.name = name;
        changed = true;
    }
    if let Some(color) = color
        && color != tag.color
    {
        tag.color = color;
        changed = true;
    }
    Ok(changed)
}

/// Remove a tag and strip its id from every task. Returns how many tasks referenced it.
pub fn delete_tag(tags: &mut Vec<Tag>, tasks: &mut [Task], id: Uuid) -> Result<usize, TaskError> {
    let before = tags.len();
    tags.retain(|t| t.id != id);
    if tags.len() == before {
        return Err(TaskError::NotFound(id));
    }
    let mut stripped = 0;
    for task in tasks.iter_mut() {
        if task.tag_ids.shift_remove(&id) {
            task.touch();
            stripped += 1;
        }
    }
    Ok(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;

    #[test]
    fn name_bounds() {
        assert!(validate_tag_name("").is_err());
        assert!(validate_tag_name("   ").is_err());
        assert_eq!(validate_tag_name(" home ").unwrap(), "home");
        assert!(validate_tag_name(&"n".repeat(TAG_NAME_MAX)).is_ok());
        assert!(validate_tag_name(&"n".repeat(TAG_NAME_MAX + 1)).is_err());
    }

    #[test]
    fn update_with_bad_name_changes_nothing() {
        let mut tags = Vec::new();
        let id = add_tag(&mut tags, "work", TagColor::Blue).unwrap();
        assert!(update_tag(&mut tags, id, Some(""), Some(TagColor::Red)).is_err());
        assert_eq!(tags[0].name, "work");
        assert_eq!(tags[0].color, TagColor::Blue);

        assert!(update_tag(&mut tags, id, None, Some(TagColor::Green)).unwrap());
        assert_eq!(tags[0].color, TagColor::Green);
    }

    #[test]
    fn update_without_change_reports_false() {
        let mut tags = Vec::new();
        let id = add_tag(&mut tags, "work", TagColor::Blue).unwrap();
        assert!(!update_tag(&mut tags, id, None, None).unwrap());
        assert!(!update_tag(&mut tags, id, Some(" work "), Some(TagColor::Blue)).unwrap());
        assert!(update_tag(&mut tags, id, Some("Work"), None).unwrap());
        assert_eq!(tags[0].name, "Work");
    }

    #[test]
    fn delete_cascades_to_tasks() {
        let mut tags = Vec::new();
        let keep = add_tag(&mut tags, "keep", TagColor::Blue).unwrap();
        let gone = add_tag(&mut tags, "gone", TagColor::Red).unwrap();

        let mut tasks = vec![
            Task::new("a".into(), Priority::None, 0),
            Task::new("b".into(), Priority::None, 0),
            Task::new("c".into(), Priority::None, 0),
        ];
        tasks[0].tag_ids.extend([gone, keep]);
        tasks[1].tag_ids.insert(gone);

        assert_eq!(delete_tag(&mut tags, &mut tasks, gone).unwrap(), 2);
        assert_eq!(tags.len(), 1);
        assert_eq!(tasks[0].tag_ids.iter().copied().collect::<Vec<_>>(), vec![keep]);
        assert!(tasks[1].tag_ids.is_empty());
        assert!(tasks[2].tag_ids.is_empty());
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let mut tags = Vec::new();
        let mut tasks: Vec<Task> = Vec::new();
        assert_eq!(
            delete_tag(&mut tags, &mut tasks, Uuid::nil()),
            Err(TaskError::NotFound(Uuid::nil()))
        );
    }

    #[test]
    fn lookup_by_name_ignores_case() {
        let mut tags = Vec::new();
        let id = add_tag(&mut tags, "Errands", TagColor::Yellow).unwrap();
        assert_eq!(find_tag_by_name(&tags, "errands").map(|t| t.id), Some(id));
        assert!(find_tag_by_name(&tags, "chores").is_none());
    }
}
