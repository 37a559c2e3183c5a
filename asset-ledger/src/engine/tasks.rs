//! Task tracker: participants, tasks, token awards and the champion

use super::{ensure_record_key, TransitionEngine};
use crate::{
    command::{AddTask, CompleteTask, CreateTaskHolder},
    error::{Error, Result},
    sequence::CHAMPION_KEY,
    state::load_record,
    types::{Champion, TaskHolder},
};

impl TransitionEngine {
    /// Register a participant with one open task
    pub fn create_task_holder(&self, cmd: &CreateTaskHolder) -> Result<()> {
        cmd.validate()?;
        ensure_record_key(&cmd.name)?;
        self.transact(&[cmd.name.as_str()], |changes| {
            changes.ensure_absent(&cmd.name)?;
            let holder = TaskHolder::new(cmd.name.clone(), cmd.task.clone(), cmd.tokens);
            changes.stage(&cmd.name, &holder)
        })?;

        tracing::info!(holder = %cmd.name, task = %cmd.task, tokens = cmd.tokens, "Task holder created");
        Ok(())
    }

    /// Open another task
    pub fn add_task(&self, cmd: &AddTask) -> Result<()> {
        cmd.validate()?;
        self.transact(&[cmd.holder.as_str()], |changes| {
            let mut holder: TaskHolder = changes.load(&cmd.holder)?;
            holder.add_task(&cmd.task)?;
            changes.stage(&cmd.holder, &holder)
        })?;

        tracing::info!(holder = %cmd.holder, task = %cmd.task, "Task added");
        Ok(())
    }

    /// Close a task, award its tokens and move the champion if overtaken
    ///
    /// The champion record is read and written under the same locks as the
    /// holder, so concurrent completions never lose the maximum.
    pub fn complete_task(&self, cmd: &CompleteTask) -> Result<()> {
        cmd.validate()?;
        let keys = [cmd.holder.as_str(), CHAMPION_KEY];

        let (tokens, overtook) = self.transact(&keys, |changes| {
            let mut holder: TaskHolder = changes.load(&cmd.holder)?;
            holder.complete(&cmd.task, cmd.tokens)?;
            changes.stage(&cmd.holder, &holder)?;

            let mut champion: Champion = changes.load_opt(CHAMPION_KEY)?.unwrap_or_default();
            let overtook = champion.observe(&holder);
            if overtook {
                changes.stage(CHAMPION_KEY, &champion)?;
            }
            Ok((holder.tokens, overtook))
        })?;

        tracing::info!(
            holder = %cmd.holder,
            task = %cmd.task,
            awarded = cmd.tokens,
            tokens,
            champion = overtook,
            "Task completed"
        );
        Ok(())
    }

    /// Current champion record, `None` before the first completion
    pub fn champion(&self) -> Result<Option<Champion>> {
        match load_record::<Champion>(self.store.as_ref(), CHAMPION_KEY) {
            Ok(champion) => Ok(Some(champion)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Participant record of the current champion
    pub(super) fn champion_holder(&self) -> Result<TaskHolder> {
        let holder = self
            .champion()?
            .and_then(|champion| champion.holder)
            .ok_or_else(|| Error::NotFound("champion (no task completed yet)".to_string()))?;
        load_record(self.store.as_ref(), &holder)
    }
}
