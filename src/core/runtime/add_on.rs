use crate::core::logic::{AddOnLogic, ExecutableLogic};
use crate::core::pin::Pin;
use crate::core::runtime::{AddOnId, ExecutableUnit, NodeHandle, UnitId};
use crate::core::template::AddOnTemplate;
use std::sync::Arc;

/// An AddOn instance owned by one node (directly, or through other AddOns).
pub struct AddOn {
    pub(crate) logic: Box<dyn AddOnLogic>,
    pub(crate) parent: UnitId,
    pub(crate) flow_node: Option<NodeHandle>,
    pub(crate) input_pins: Vec<Pin>,
    pub(crate) output_pins: Vec<Pin>,
    pub(crate) add_on_templates: Arc<Vec<AddOnTemplate>>,
    pub(crate) add_ons: Vec<AddOnId>,
}

impl AddOn {
    pub(crate) fn from_template(template: &AddOnTemplate, parent: UnitId) -> Self {
        let logic = template.logic().clone_box();
        let input_pins = logic.input_pins();
        let output_pins = logic.output_pins();
        Self {
            logic,
            parent,
            flow_node: None,
            input_pins,
            output_pins,
            add_on_templates: template.shared_add_ons(),
            add_ons: Vec::new(),
        }
    }

    pub fn logic(&self) -> &dyn AddOnLogic {
        self.logic.as_ref()
    }

    pub fn logic_as<T: AddOnLogic>(&self) -> Option<&T> {
        (*self.logic).as_any().downcast_ref::<T>()
    }

    pub fn logic_as_mut<T: AddOnLogic>(&mut self) -> Option<&mut T> {
        (*self.logic).as_any_mut().downcast_mut::<T>()
    }

    pub fn class_name(&self) -> &'static str {
        (*self.logic).class_name()
    }

    /// The node or AddOn this one is attached to.
    pub fn parent(&self) -> UnitId {
        self.parent
    }

    /// The anchor node.
    ///
    /// # Panics
    /// Outside the initialized window of the AddOn, where the anchor is unset.
    pub fn flow_node(&self) -> NodeHandle {
        match self.flow_node {
            Some(handle) => handle,
            None => panic!(
                "AddOn {} has no anchor node: it is used before initialization or after deinitialization",
                self.class_name()
            ),
        }
    }

    pub fn try_flow_node(&self) -> Option<NodeHandle> {
        self.flow_node
    }

    pub fn input_pins(&self) -> &[Pin] {
        &self.input_pins
    }

    pub fn output_pins(&self) -> &[Pin] {
        &self.output_pins
    }

    pub fn add_ons(&self) -> &[AddOnId] {
        &self.add_ons
    }
}

impl ExecutableUnit for AddOn {
    fn logic(&self) -> &dyn ExecutableLogic {
        (*self.logic).as_executable()
    }

    fn logic_mut(&mut self) -> &mut dyn ExecutableLogic {
        (*self.logic).as_executable_mut()
    }

    fn add_on_ids(&self) -> &[AddOnId] {
        &self.add_ons
    }

    fn declared_input_pins(&self) -> &[Pin] {
        &self.input_pins
    }
}
