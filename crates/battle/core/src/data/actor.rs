use super::Trait;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ActorData {
    pub id: u32,
    pub name: String,
    pub nickname: String,
    pub class_id: u32,
    pub initial_level: i32,
    pub max_level: i32,
    /// Initial equipment per slot; 0 leaves the slot empty.
    pub equips: Vec<u32>,
    pub traits: Vec<Trait>,
}

impl Default for ActorData {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            nickname: String::new(),
            class_id: 1,
            initial_level: 1,
            max_level: 99,
            equips: Vec::new(),
            traits: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Learning {
    pub level: i32,
    pub skill_id: u32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ClassData {
    pub id: u32,
    pub name: String,
    /// Experience curve: basis, extra, acceleration A, acceleration B.
    pub exp_params: [f64; 4],
    /// `params[param_id][level]`.
    pub params: Vec<Vec<i32>>,
    pub learnings: Vec<Learning>,
    pub traits: Vec<Trait>,
}

impl Default for ClassData {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            exp_params: [30.0, 20.0, 30.0, 30.0],
            params: Vec::new(),
            learnings: Vec::new(),
            traits: Vec::new(),
        }
    }
}

impl ClassData {
    /// Base value of `param_id` at `level`; missing rows read as 0.
    pub fn param_at(&self, param_id: usize, level: i32) -> i32 {
        usize::try_from(level)
            .ok()
            .and_then(|level| self.params.get(param_id)?.get(level).copied())
            .unwrap_or(0)
    }

    /// Total experience needed to reach `level`.
    pub fn exp_for_level(&self, level: i32) -> i64 {
        let [basis, extra, acc_a, acc_b] = self.exp_params;
        let lv = f64::from(level);
        let curve = basis * (lv - 1.0).powf(0.9 + acc_a / 250.0) * lv * (lv + 1.0)
            / (6.0 + lv.powi(2) / 50.0 / acc_b)
            + (lv - 1.0) * extra;
        curve.round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_needs_no_experience() {
        let class = ClassData::default();
        assert_eq!(class.exp_for_level(1), 0);
        assert!(class.exp_for_level(2) > 0);
        assert!(class.exp_for_level(10) > class.exp_for_level(9));
    }

    #[test]
    fn missing_param_rows_read_zero() {
        let class = ClassData {
            params: vec![vec![0, 450, 500]],
            ..ClassData::default()
        };
        assert_eq!(class.param_at(0, 2), 500);
        assert_eq!(class.param_at(0, 9), 0);
        assert_eq!(class.param_at(3, 1), 0);
    }
}
