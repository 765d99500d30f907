use good_lp::{variable, Constraint, Expression, ProblemVariables, Solution, Variable};
use log::trace;

/// A model that has been built but not yet handed to a solver: the variables, a minimisation
/// objective and a set of named constraints.
pub struct Formulation {
    name: String,
    variables: ProblemVariables,
    objective: Expression,
    constraints: Vec<(String, Constraint)>,
}

impl Formulation {
    pub fn new(name: &str) -> Formulation {
        Formulation {
            name: name.to_string(),
            variables: ProblemVariables::new(),
            objective: Expression::with_capacity(0),
            constraints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a single variable to the model
    pub fn add_var(&mut self, name: String, vtype: VarType) -> Variable {
        let definition = match vtype {
            VarType::Continuous => variable().min(0.0),
            VarType::Binary => variable().binary(),
        };
        self.variables.add(definition.name(name))
    }

    pub fn add_constr(&mut self, name: &str, constraint: Constraint) {
        trace!("{}: adding constraint {}", self.name, name);
        self.constraints.push((name.to_string(), constraint));
    }

    /// Sets the expression to be minimised
    pub fn set_objective(&mut self, objective: Expression) {
        self.objective = objective;
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint_names(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn into_parts(self) -> (ProblemVariables, Expression, Vec<(String, Constraint)>) {
        (self.variables, self.objective, self.constraints)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// Non-negative continuous variable
    Continuous,
    /// Variable restricted to 0 or 1
    Binary,
}

pub trait AddVars {
    type Out;

    /// Create a variable for any type
    fn vars(&self, model: &mut Formulation, base_name: &str, vtype: VarType) -> Self::Out;

    /// Binary variables
    fn binary(&self, model: &mut Formulation, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Binary)
    }

    /// A continuous non-negative variable
    fn cont(&self, model: &mut Formulation, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Continuous)
    }
}

impl AddVars for usize {
    type Out = Vec<Variable>;

    fn vars(&self, model: &mut Formulation, base_name: &str, vtype: VarType) -> Self::Out {
        (0..*self)
            .map(|i| model.add_var(format!("{}_{}", base_name, i), vtype))
            .collect()
    }
}

impl AddVars for (usize, usize) {
    type Out = Vec<<usize as AddVars>::Out>;

    fn vars(&self, model: &mut Formulation, base_name: &str, vtype: VarType) -> Self::Out {
        (0..self.0)
            .map(|i| self.1.vars(model, &format!("{}_{}", base_name, i), vtype))
            .collect()
    }
}

/// Trait that converts solver variables to their values in a solution
pub trait ConvertVars {
    type Out;
    fn convert<S: Solution>(&self, solution: &S) -> Self::Out;
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert<S: Solution>(&self, solution: &S) -> Self::Out {
        self.iter().map(|e| e.convert(solution)).collect()
    }
}

impl ConvertVars for Variable {
    type Out = f64;

    fn convert<S: Solution>(&self, solution: &S) -> Self::Out {
        solution.value(*self)
    }
}
